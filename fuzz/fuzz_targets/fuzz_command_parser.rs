//! Fuzz target: inbound pump command parsing
//!
//! Splits arbitrary bytes into a topic and a payload and runs them through
//! `parse_pump_command`, asserting it never panics and that any accepted
//! command names a configured channel on a topic under the pump base.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use irrigator::app::commands::parse_pump_command;
use irrigator::topics;
use libfuzzer_sys::fuzz_target;

const BASE: &str = "greenhouse/pump";

fuzz_target!(|data: &[u8]| {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let count = usize::from(count % 9);
    let split = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let (topic, payload) = rest.split_at(split);
    let payload = payload.get(1..).unwrap_or_default();

    let Ok(topic) = core::str::from_utf8(topic) else {
        return;
    };

    if let Ok(cmd) = parse_pump_command(topic, payload, BASE, count) {
        assert!(cmd.channel() < count, "channel out of range");
        assert!(topic.starts_with(BASE));
        assert_eq!(topics::channel_topic(BASE, cmd.channel(), count), topic);
    }
});
