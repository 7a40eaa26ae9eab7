#![no_main]

use libfuzzer_sys::fuzz_target;
use xrpl_ledger_monitor::services::{aggregator::BlockPipeline, normalizer::normalize};

fuzz_target!(|data: &[u8]| {
	let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
		return;
	};
	if let Ok(record) = normalize(&raw) {
		assert!(!record.sender.is_empty());
	}
	let stats = BlockPipeline::default().process(std::slice::from_ref(&raw));
	assert_eq!(stats.tx_count + stats.parse_failures, 1);
});
