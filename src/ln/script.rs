// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The upfront shutdown script convention shared by `open_channel` and `accept_channel`.
//!
//! Both messages end in a TLV stream. The upfront shutdown script occupies the lowest type in
//! that stream ([`SHUTDOWN_SCRIPT_TYPE`]), and a sender which includes any TLV data at all MUST
//! include the shutdown script record, even if it is zero-length. A receiver can therefore split
//! the script off the front of the stream at a fixed offset instead of searching for it, and a
//! non-empty stream which doesn't start with it is invalid.

use bitcoin::script::ScriptBuf;

use crate::ln::msgs::DecodeError;
use crate::util::ser::MAX_BUF_SIZE;
use crate::util::tlv::{self, ExtraOpaqueData, TlvPackError, SHUTDOWN_SCRIPT_TYPE};

/// The longest shutdown script we will send or accept, in bytes.
///
/// This fits every standard script pubkey: P2WSH and P2TR are 34 bytes, P2PKH 25, P2SH and P2WPKH
/// 22 or 23.
pub const MAX_SHUTDOWN_SCRIPT_LEN: usize = 34;

/// Builds the TLV stream for an `open_channel` or `accept_channel` message: the shutdown script
/// record followed by `extra_data` unchanged.
///
/// The shutdown script record is written even when `script` is `None` or empty, in which case it
/// is zero-length.
pub fn pack_shutdown_script(
	script: Option<&ScriptBuf>, extra_data: &ExtraOpaqueData,
) -> Result<Vec<u8>, TlvPackError> {
	let script_bytes = script.map(|s| s.as_bytes()).unwrap_or(&[]);
	if script_bytes.len() > MAX_SHUTDOWN_SCRIPT_LEN {
		return Err(TlvPackError::ShutdownScriptTooLong { len: script_bytes.len() });
	}
	if let Some(typ) = extra_data.leading_type() {
		if typ <= SHUTDOWN_SCRIPT_TYPE {
			return Err(TlvPackError::UnorderedRecords { typ });
		}
	}

	let len = 2 + script_bytes.len() + extra_data.as_bytes().len();
	if len > MAX_BUF_SIZE {
		return Err(TlvPackError::StreamTooLong { len });
	}

	let mut tlv_records = Vec::with_capacity(len);
	// Writing into a Vec cannot fail.
	let _ = tlv::pack_record(&mut tlv_records, SHUTDOWN_SCRIPT_TYPE, script_bytes);
	tlv_records.extend_from_slice(extra_data.as_bytes());
	Ok(tlv_records)
}

/// Splits the shutdown script off the front of an `open_channel` or `accept_channel` TLV stream,
/// returning it along with the remaining records.
///
/// An empty stream yields no script at all, which is distinct from a present but zero-length
/// script. A non-empty stream must start with the shutdown script record, and the records after it
/// must be well-formed and in increasing type order.
pub fn parse_shutdown_script(
	tlv_records: &[u8],
) -> Result<(Option<ScriptBuf>, ExtraOpaqueData), DecodeError> {
	let (script, remainder) = match tlv::extract_leading_record(tlv_records, SHUTDOWN_SCRIPT_TYPE)? {
		Some(record) => record,
		None if tlv_records.is_empty() => return Ok((None, ExtraOpaqueData::new())),
		None => return Err(DecodeError::MissingShutdownScript),
	};
	if script.len() > MAX_SHUTDOWN_SCRIPT_LEN {
		return Err(DecodeError::InvalidValue);
	}

	tlv::read_tlv_stream(remainder, Some(SHUTDOWN_SCRIPT_TYPE))?;
	let extra_data = ExtraOpaqueData::from_bytes(remainder.to_vec())?;
	Ok((Some(ScriptBuf::from_bytes(script.to_vec())), extra_data))
}
