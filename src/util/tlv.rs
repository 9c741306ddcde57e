// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Type-length-value records as appended to the end of Lightning messages.
//!
//! Each record is a [`BigSize`] type, a [`BigSize`] length and then exactly that many bytes of
//! value. Within a stream, record types must be strictly increasing. Records this crate knows
//! about are surfaced as their own [`TlvRecord`] variant; anything else is carried as
//! [`TlvRecord::Unknown`] and written back exactly as it was read.

use std::fmt;
use std::io::{self, Read};

use bitcoin::script::ScriptBuf;

use crate::ln::msgs::DecodeError;
use crate::util::ser::{BigSize, FixedLengthReader, ReadTrackingReader, Readable, Writeable, Writer};

/// The TLV type of the upfront shutdown script in `open_channel` and `accept_channel`.
///
/// This is the lowest type in the namespace of both messages, so whenever their TLV stream is
/// non-empty it is the first record.
pub const SHUTDOWN_SCRIPT_TYPE: u64 = 0;

/// A single TLV record.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum TlvRecord {
	/// The upfront shutdown script (type [`SHUTDOWN_SCRIPT_TYPE`]).
	ShutdownScript(ScriptBuf),
	/// A record of a type we don't interpret, preserved verbatim.
	Unknown {
		/// The record type.
		typ: u64,
		/// The raw record value.
		value: Vec<u8>,
	},
}

impl TlvRecord {
	fn from_parts(typ: u64, value: Vec<u8>) -> Self {
		match typ {
			SHUTDOWN_SCRIPT_TYPE => TlvRecord::ShutdownScript(ScriptBuf::from_bytes(value)),
			_ => TlvRecord::Unknown { typ, value },
		}
	}

	/// The record's TLV type.
	pub fn type_id(&self) -> u64 {
		match self {
			TlvRecord::ShutdownScript(_) => SHUTDOWN_SCRIPT_TYPE,
			TlvRecord::Unknown { typ, .. } => *typ,
		}
	}

	/// The record's value bytes, without the type and length prefix.
	pub fn value(&self) -> &[u8] {
		match self {
			TlvRecord::ShutdownScript(script) => script.as_bytes(),
			TlvRecord::Unknown { value, .. } => value,
		}
	}

	/// The number of bytes this record occupies on the wire.
	pub fn encoded_len(&self) -> usize {
		let value_len = self.value().len();
		BigSize::encoded_len(self.type_id()) + BigSize::encoded_len(value_len as u64) + value_len
	}
}

impl Writeable for TlvRecord {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error> {
		pack_record(writer, self.type_id(), self.value())
	}
}

impl Readable for TlvRecord {
	fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
		let typ: BigSize = Readable::read(reader)?;
		let length: BigSize = Readable::read(reader)?;
		// The length is peer-controlled, so let the buffer grow with the bytes actually read.
		let mut s = FixedLengthReader::new(reader, length.0);
		let mut value = Vec::new();
		s.read_to_end(&mut value)?;
		if s.bytes_remain() {
			return Err(DecodeError::ShortRead);
		}
		Ok(TlvRecord::from_parts(typ.0, value))
	}
}

/// Writes a single record with the given type and value.
pub fn pack_record<W: Writer>(writer: &mut W, typ: u64, value: &[u8]) -> Result<(), io::Error> {
	BigSize(typ).write(writer)?;
	BigSize(value.len() as u64).write(writer)?;
	writer.write_all(value)
}

/// Splits the record of type `typ` off the front of `blob`.
///
/// Returns the record's value and the bytes following it, or `None` if `blob` is empty or its
/// first record is of a different type. Callers must only use this for a type which, by the
/// ordering rules of their TLV namespace, is always first when present: the rest of the stream is
/// never searched.
pub fn extract_leading_record(blob: &[u8], typ: u64) -> Result<Option<(&[u8], &[u8])>, DecodeError> {
	if blob.is_empty() {
		return Ok(None);
	}

	let mut reader = io::Cursor::new(blob);
	let leading_type: BigSize = Readable::read(&mut reader)?;
	if leading_type.0 != typ {
		return Ok(None);
	}
	let length: BigSize = Readable::read(&mut reader)?;

	let value_start = reader.position() as usize;
	if length.0 > (blob.len() - value_start) as u64 {
		return Err(DecodeError::ShortRead);
	}
	let value_end = value_start + length.0 as usize;
	Ok(Some((&blob[value_start..value_end], &blob[value_end..])))
}

/// Reads every record in `bytes`, checking that types strictly increase and that the first is
/// greater than `last_seen_type`, if one is given.
pub(crate) fn read_tlv_stream(bytes: &[u8], mut last_seen_type: Option<u64>) -> Result<Vec<TlvRecord>, DecodeError> {
	let mut stream = io::Cursor::new(bytes);
	let mut records = Vec::new();
	loop {
		// Peek at the type so that hitting the end of the stream on a record boundary terminates
		// the loop while hitting it mid-record is a ShortRead.
		let typ: BigSize = {
			let mut tracking_reader = ReadTrackingReader::new(&mut stream);
			match Readable::read(&mut tracking_reader) {
				Err(DecodeError::ShortRead) => {
					if !tracking_reader.have_read {
						break;
					} else {
						return Err(DecodeError::ShortRead);
					}
				},
				Err(e) => return Err(e),
				Ok(t) => t,
			}
		};

		// Types must be unique and monotonically increasing:
		match last_seen_type {
			Some(t) if typ.0 <= t => return Err(DecodeError::InvalidValue),
			_ => {},
		}
		last_seen_type = Some(typ.0);

		let length: BigSize = Readable::read(&mut stream)?;
		let mut s = FixedLengthReader::new(&mut stream, length.0);
		let mut value = Vec::new();
		s.read_to_end(&mut value)?;
		if s.bytes_remain() {
			return Err(DecodeError::ShortRead);
		}
		records.push(TlvRecord::from_parts(typ.0, value));
	}
	Ok(records)
}

/// An error preventing a set of records from being packed into a TLV stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TlvPackError {
	/// The upfront shutdown script is longer than
	/// [`MAX_SHUTDOWN_SCRIPT_LEN`](crate::ln::script::MAX_SHUTDOWN_SCRIPT_LEN).
	ShutdownScriptTooLong {
		/// The length of the rejected script.
		len: usize,
	},
	/// A record's type was not strictly greater than the type of the record before it.
	UnorderedRecords {
		/// The type of the offending record.
		typ: u64,
	},
	/// The packed stream does not fit behind the u16 length prefix it is written with.
	StreamTooLong {
		/// The length of the packed stream.
		len: usize,
	},
}

impl fmt::Display for TlvPackError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			TlvPackError::ShutdownScriptTooLong { len } => {
				write!(f, "unable to pack upfront shutdown script as TLV record: {} bytes is too long", len)
			},
			TlvPackError::UnorderedRecords { typ } => {
				write!(f, "TLV record of type {} is out of order", typ)
			},
			TlvPackError::StreamTooLong { len } => {
				write!(f, "TLV stream of {} bytes is too long for a u16 length prefix", len)
			},
		}
	}
}

impl std::error::Error for TlvPackError {}

impl From<TlvPackError> for io::Error {
	fn from(e: TlvPackError) -> Self {
		io::Error::new(io::ErrorKind::InvalidInput, e)
	}
}

/// Opaque TLV records appended to a message which this crate does not interpret.
///
/// The bytes always form a well-formed TLV stream with strictly increasing types, as they can
/// only be built from such a stream or from a list of ordered records.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct ExtraOpaqueData(Vec<u8>);

impl ExtraOpaqueData {
	/// An empty set of extra records.
	pub fn new() -> Self {
		ExtraOpaqueData(Vec::new())
	}

	/// Wraps an already serialized TLV stream, failing if it is malformed or out of order.
	pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
		read_tlv_stream(&bytes, None)?;
		Ok(ExtraOpaqueData(bytes))
	}

	/// Packs `records`, which must be given in strictly increasing type order.
	pub fn from_records<'a, I: IntoIterator<Item = &'a TlvRecord>>(records: I) -> Result<Self, TlvPackError> {
		let mut bytes = Vec::new();
		let mut last_seen_type: Option<u64> = None;
		for record in records {
			let typ = record.type_id();
			match last_seen_type {
				Some(t) if typ <= t => return Err(TlvPackError::UnorderedRecords { typ }),
				_ => {},
			}
			last_seen_type = Some(typ);
			bytes.reserve(record.encoded_len());
			// Writing into a Vec cannot fail.
			let _ = pack_record(&mut bytes, typ, record.value());
		}
		Ok(ExtraOpaqueData(bytes))
	}

	/// Parses the stream back into its records.
	pub fn records(&self) -> Result<Vec<TlvRecord>, DecodeError> {
		read_tlv_stream(&self.0, None)
	}

	/// The type of the first record, if any.
	pub fn leading_type(&self) -> Option<u64> {
		let mut reader = io::Cursor::new(&self.0[..]);
		<BigSize as Readable>::read(&mut reader).ok().map(|typ| typ.0)
	}

	/// The serialized stream.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Whether there are no records at all.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use bitcoin::hex::FromHex;

	fn unknown(typ: u64, value: &[u8]) -> TlvRecord {
		TlvRecord::Unknown { typ, value: value.to_vec() }
	}

	#[test]
	fn pack_then_extract_leading_record() {
		let tail = ExtraOpaqueData::from_records(&[unknown(1, &[0xaa]), unknown(0xfd, &[1, 2, 3])]).unwrap();
		let mut blob = Vec::new();
		pack_record(&mut blob, 0, &[0xde, 0xad]).unwrap();
		blob.extend_from_slice(tail.as_bytes());

		let (value, remainder) = extract_leading_record(&blob, 0).unwrap().unwrap();
		assert_eq!(value, &[0xde, 0xad]);
		assert_eq!(remainder, tail.as_bytes());
	}

	#[test]
	fn extract_from_empty_blob_is_absent() {
		assert_eq!(extract_leading_record(&[], 0).unwrap(), None);
	}

	#[test]
	fn extract_ignores_other_leading_types() {
		let blob = <Vec<u8>>::from_hex("0101aa").unwrap();
		assert_eq!(extract_leading_record(&blob, 0).unwrap(), None);
	}

	#[test]
	fn extract_truncated_record() {
		// Declares three bytes of value but only carries two.
		let blob = <Vec<u8>>::from_hex("0003aabb").unwrap();
		assert_eq!(extract_leading_record(&blob, 0).unwrap_err(), DecodeError::ShortRead);
		// Missing the length entirely.
		let blob = <Vec<u8>>::from_hex("00").unwrap();
		assert_eq!(extract_leading_record(&blob, 0).unwrap_err(), DecodeError::ShortRead);
		// Non-canonical BigSize length.
		let blob = <Vec<u8>>::from_hex("00fd0001aa").unwrap();
		assert_eq!(extract_leading_record(&blob, 0).unwrap_err(), DecodeError::InvalidValue);
	}

	#[test]
	fn extract_zero_length_record() {
		let blob = <Vec<u8>>::from_hex("00000307abcdef").unwrap();
		let (value, remainder) = extract_leading_record(&blob, 0).unwrap().unwrap();
		assert!(value.is_empty());
		assert_eq!(remainder, &<Vec<u8>>::from_hex("0307abcdef").unwrap()[..]);
	}

	#[test]
	fn stream_ordering_is_enforced() {
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("0100").unwrap(), Some(1)).unwrap_err(), DecodeError::InvalidValue);
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("03000100").unwrap(), None).unwrap_err(), DecodeError::InvalidValue);
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("03000300").unwrap(), None).unwrap_err(), DecodeError::InvalidValue);

		let records = read_tlv_stream(&<Vec<u8>>::from_hex("0100fd00fe0155").unwrap(), Some(0)).unwrap();
		assert_eq!(records, vec![unknown(1, &[]), unknown(0xfe, &[0x55])]);
	}

	#[test]
	fn stream_truncation_is_a_short_read() {
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("0102aa").unwrap(), None).unwrap_err(), DecodeError::ShortRead);
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("01").unwrap(), None).unwrap_err(), DecodeError::ShortRead);
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("fd01").unwrap(), None).unwrap_err(), DecodeError::ShortRead);
		// A huge declared length must not be trusted for allocation.
		assert_eq!(read_tlv_stream(&<Vec<u8>>::from_hex("01ff0100000000000000aa").unwrap(), None).unwrap_err(), DecodeError::ShortRead);
	}

	#[test]
	fn known_types_are_tagged() {
		let records = read_tlv_stream(&<Vec<u8>>::from_hex("000201020500").unwrap(), None).unwrap();
		assert_eq!(records, vec![TlvRecord::ShutdownScript(ScriptBuf::from_bytes(vec![1, 2])), unknown(5, &[])]);
		assert_eq!(records[0].type_id(), SHUTDOWN_SCRIPT_TYPE);
		assert_eq!(records[1].encoded_len(), 2);
	}

	#[test]
	fn record_read_write() {
		let record = unknown(0x10000, &[9; 300]);
		let encoded = record.encode().unwrap();
		assert_eq!(encoded.len(), record.encoded_len());
		assert_eq!(&encoded[..8], &<Vec<u8>>::from_hex("fe00010000fd012c").unwrap()[..]);
		let decoded: TlvRecord = Readable::read(&mut io::Cursor::new(&encoded)).unwrap();
		assert_eq!(decoded, record);
	}

	#[test]
	fn extra_opaque_data_preserves_bytes() {
		let bytes = <Vec<u8>>::from_hex("0101aa0300fd01000200ff").unwrap();
		let extra = ExtraOpaqueData::from_bytes(bytes.clone()).unwrap();
		assert_eq!(extra.as_bytes(), &bytes[..]);
		assert_eq!(extra.leading_type(), Some(1));
		assert_eq!(extra.records().unwrap(), vec![unknown(1, &[0xaa]), unknown(3, &[]), unknown(0x100, &[0x00, 0xff])]);

		assert!(ExtraOpaqueData::new().is_empty());
		assert_eq!(ExtraOpaqueData::new().leading_type(), None);
		assert_eq!(ExtraOpaqueData::from_bytes(<Vec<u8>>::from_hex("03000100").unwrap()).unwrap_err(), DecodeError::InvalidValue);
	}

	#[test]
	fn from_records_rejects_unordered() {
		assert_eq!(
			ExtraOpaqueData::from_records(&[unknown(3, &[]), unknown(3, &[])]).unwrap_err(),
			TlvPackError::UnorderedRecords { typ: 3 },
		);
		assert_eq!(
			ExtraOpaqueData::from_records(&[unknown(5, &[]), unknown(1, &[])]).unwrap_err(),
			TlvPackError::UnorderedRecords { typ: 1 },
		);
	}

	#[test]
	fn pack_errors_become_invalid_input() {
		let err: io::Error = TlvPackError::ShutdownScriptTooLong { len: 40 }.into();
		assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
		let inner = err.get_ref().unwrap().downcast_ref::<TlvPackError>().unwrap();
		assert_eq!(*inner, TlvPackError::ShutdownScriptTooLong { len: 40 });
	}
}
