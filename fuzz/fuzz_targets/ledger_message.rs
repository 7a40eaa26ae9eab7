#![no_main]

use libfuzzer_sys::fuzz_target;
use xrpl_ledger_monitor::{models::LedgerClosed, services::stream::transactions_from_response};

fuzz_target!(|data: &[u8]| {
	let Ok(message) = serde_json::from_slice::<serde_json::Value>(data) else {
		return;
	};
	if let Some(ledger) = LedgerClosed::from_message(&message) {
		let _ = ledger.close_time_formatted();
	}
	let _ = transactions_from_response(&message);
});
