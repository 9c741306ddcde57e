// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Wire encoding/decoding for Lightning messages according to [BOLT #1].
//!
//! Messages known by this module can be read from the wire using a [`MessageRegistry`]. The
//! [`Message`] enum returned by [`MessageRegistry::read`] wraps the decoded message or the message
//! type (if unknown) to use with pattern matching.
//!
//! Messages implementing the [`Encode`] trait define a message type and can be sent over the wire
//! using [`write`].
//!
//! [BOLT #1]: https://github.com/lightning/bolts/blob/master/01-messaging.md

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::ops::Deref;

use crate::ln::msgs::{self, DecodeError};
use crate::util::logger::Logger;
use crate::util::ser::{Readable, Writeable, Writer};

/// The protocol version messages are currently written with.
///
/// Neither [`msgs::OpenChannel`] nor [`msgs::AcceptChannel`] changes its layout between versions,
/// so this is only threaded through to the per-type decoders.
pub const PROTOCOL_VERSION: u32 = 0;

/// A Lightning message returned by [`MessageRegistry::read`] when decoding bytes received over the
/// wire. Each variant contains a message from [`msgs`] or otherwise the message type if unknown.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
	OpenChannel(msgs::OpenChannel),
	AcceptChannel(msgs::AcceptChannel),
	/// A message that could not be decoded because its type is unknown.
	Unknown(MessageType),
}

/// A number identifying a message to determine how it is encoded on the wire.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MessageType(u16);

impl Message {
	/// Returns the type that was used to decode the message payload.
	pub fn type_id(&self) -> MessageType {
		match self {
			&Message::OpenChannel(ref msg) => msg.type_id(),
			&Message::AcceptChannel(ref msg) => msg.type_id(),
			&Message::Unknown(type_id) => type_id,
		}
	}
}

impl MessageType {
	/// Returns whether the message type is even, indicating both endpoints must support it.
	pub fn is_even(&self) -> bool {
		(self.0 & 1) == 0
	}
}

impl fmt::Display for MessageType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Decodes a message payload of one particular type.
type MessageDecoder = fn(&mut dyn io::Read, u32) -> Result<Message, DecodeError>;

fn decode_open_channel(mut buffer: &mut dyn io::Read, _pver: u32) -> Result<Message, DecodeError> {
	Ok(Message::OpenChannel(Readable::read(&mut buffer)?))
}

fn decode_accept_channel(mut buffer: &mut dyn io::Read, _pver: u32) -> Result<Message, DecodeError> {
	Ok(Message::AcceptChannel(Readable::read(&mut buffer)?))
}

/// A table from message type to the decoder for that type.
///
/// The table is fixed once built, so a single registry can be shared by reference between any
/// number of readers.
pub struct MessageRegistry {
	decoders: HashMap<u16, MessageDecoder>,
}

impl MessageRegistry {
	/// Builds a registry which knows every message this crate can decode.
	pub fn new() -> Self {
		let mut decoders: HashMap<u16, MessageDecoder> = HashMap::new();
		decoders.insert(msgs::OpenChannel::TYPE, decode_open_channel);
		decoders.insert(msgs::AcceptChannel::TYPE, decode_accept_channel);
		MessageRegistry { decoders }
	}

	/// Returns whether messages of the given type can be decoded.
	pub fn supports(&self, message_type: u16) -> bool {
		self.decoders.contains_key(&message_type)
	}

	/// Reads a message from the data buffer consisting of a 2-byte big-endian type and a
	/// variable-length payload conforming to the type.
	///
	/// # Errors
	///
	/// Returns an error if the message payload could not be decoded as the specified type.
	pub fn read<R: io::Read>(&self, buffer: &mut R, pver: u32) -> Result<Message, DecodeError> {
		let message_type = <u16 as Readable>::read(buffer)?;
		match self.decoders.get(&message_type) {
			Some(decoder) => decoder(buffer, pver),
			None => Ok(Message::Unknown(MessageType(message_type))),
		}
	}

	/// Same as [`Self::read`], but logs the outcome to `logger` before returning it.
	pub fn read_logged<R: io::Read, L: Deref>(
		&self, buffer: &mut R, pver: u32, logger: L,
	) -> Result<Message, DecodeError>
	where
		L::Target: Logger,
	{
		let res = self.read(buffer, pver);
		match &res {
			Ok(Message::Unknown(message_type)) => {
				log_debug!(logger, "Received unknown message of type {}", message_type);
			},
			Ok(Message::OpenChannel(msg)) => {
				log_trace!(logger, "Received open_channel for temporary channel {}", log_bytes!(msg.temporary_channel_id));
			},
			Ok(Message::AcceptChannel(msg)) => {
				log_trace!(logger, "Received accept_channel for temporary channel {} with funding key {}",
					log_bytes!(msg.temporary_channel_id), log_pubkey!(msg.funding_pubkey));
			},
			Err(e) => {
				log_error!(logger, "Failed to decode message: {}", e);
			},
		}
		res
	}
}

impl Default for MessageRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Writes a message to the data buffer encoded as a 2-byte big-endian type and a variable-length
/// payload.
///
/// # Errors
///
/// Returns an I/O error if the write could not be completed, or one of kind
/// [`io::ErrorKind::InvalidInput`] if the message violates a protocol limit.
pub fn write<M: Encode + Writeable, W: Writer>(
	message: &M, _pver: u32, buffer: &mut W,
) -> Result<(), io::Error> {
	M::TYPE.write(buffer)?;
	message.write(buffer)
}

/// Defines a type identifier for sending messages over the wire.
///
/// Messages implementing this trait specify a type and must be [`Writeable`].
pub trait Encode {
	/// The type identifying the message payload.
	const TYPE: u16;

	/// Returns the type identifying the message payload.
	fn type_id(&self) -> MessageType {
		MessageType(Self::TYPE)
	}
}

impl Encode for msgs::OpenChannel {
	const TYPE: u16 = 32;
}

impl Encode for msgs::AcceptChannel {
	const TYPE: u16 = 33;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ln::types::MilliSatoshi;
	use crate::util::test_utils::{self, TestLogger};
	use crate::util::tlv::ExtraOpaqueData;

	use bitcoin::script::ScriptBuf;
	use bitcoin::SignedAmount;

	use std::io::Cursor;

	fn accept_channel() -> msgs::AcceptChannel {
		let [pubkey_1, pubkey_2, pubkey_3, pubkey_4, pubkey_5, pubkey_6] = test_utils::channel_pubkeys();
		msgs::AcceptChannel {
			temporary_channel_id: [0x42; 32],
			dust_limit: SignedAmount::from_sat(546),
			max_htlc_value_in_flight: MilliSatoshi(1_000_000_000),
			channel_reserve: SignedAmount::from_sat(9_835),
			htlc_minimum: MilliSatoshi(1),
			minimum_depth: 3,
			to_self_delay: 144,
			max_accepted_htlcs: 30,
			funding_pubkey: pubkey_1,
			revocation_basepoint: pubkey_2,
			payment_basepoint: pubkey_3,
			delayed_payment_basepoint: pubkey_4,
			htlc_basepoint: pubkey_5,
			first_per_commitment_point: pubkey_6,
			upfront_shutdown_script: Some(ScriptBuf::new()),
			extra_data: ExtraOpaqueData::new(),
		}
	}

	#[test]
	fn read_empty_buffer() {
		let buffer: [u8; 0] = [];
		let mut reader = Cursor::new(buffer);
		assert!(MessageRegistry::new().read(&mut reader, PROTOCOL_VERSION).is_err());
	}

	#[test]
	fn read_incomplete_type() {
		let buffer = [0u8];
		let mut reader = Cursor::new(buffer);
		assert_eq!(MessageRegistry::new().read(&mut reader, PROTOCOL_VERSION).unwrap_err(), DecodeError::ShortRead);
	}

	#[test]
	fn read_empty_payload() {
		let buffer = 33u16.to_be_bytes();
		let mut reader = Cursor::new(buffer);
		assert_eq!(MessageRegistry::new().read(&mut reader, PROTOCOL_VERSION).unwrap_err(), DecodeError::ShortRead);
	}

	#[test]
	fn read_unknown_message() {
		let buffer = u16::MAX.to_be_bytes();
		let mut reader = Cursor::new(buffer);
		let message = MessageRegistry::new().read(&mut reader, PROTOCOL_VERSION).unwrap();
		match message {
			Message::Unknown(MessageType(u16::MAX)) => (),
			_ => panic!("Expected message type {}; found: {}", u16::MAX, message.type_id()),
		}
	}

	#[test]
	fn write_message_with_type() {
		let message = accept_channel();
		let mut buffer = Vec::new();
		assert!(write(&message, PROTOCOL_VERSION, &mut buffer).is_ok());

		let type_length = std::mem::size_of::<u16>();
		let (type_bytes, payload_bytes) = buffer.split_at(type_length);
		assert_eq!(type_bytes, &[0, 33]);
		assert_eq!(payload_bytes, &message.encode().unwrap()[..]);
	}

	#[test]
	fn read_message_encoded_with_write() {
		let message = accept_channel();
		let mut buffer = Vec::new();
		write(&message, PROTOCOL_VERSION, &mut buffer).unwrap();

		let mut reader = Cursor::new(buffer);
		let decoded_message = MessageRegistry::new().read(&mut reader, PROTOCOL_VERSION).unwrap();
		match decoded_message {
			Message::AcceptChannel(ref msg) => assert_eq!(*msg, message),
			_ => panic!("Expected accept_channel message; found message type: {}", decoded_message.type_id()),
		}
		assert_eq!(decoded_message.type_id(), message.type_id());
	}

	#[test]
	fn registry_knows_channel_establishment_messages() {
		let registry = MessageRegistry::default();
		assert!(registry.supports(32));
		assert!(registry.supports(33));
		assert!(!registry.supports(34));
		assert_eq!(msgs::OpenChannel::TYPE, 32);
		assert_eq!(msgs::AcceptChannel::TYPE, 33);
	}

	#[test]
	fn registry_is_shareable_between_threads() {
		let registry = MessageRegistry::new();
		let mut buffer = Vec::new();
		write(&accept_channel(), PROTOCOL_VERSION, &mut buffer).unwrap();

		std::thread::scope(|s| {
			for _ in 0..4 {
				s.spawn(|| {
					let message = registry.read(&mut Cursor::new(&buffer), PROTOCOL_VERSION).unwrap();
					assert_eq!(message, Message::AcceptChannel(accept_channel()));
				});
			}
		});
	}

	#[test]
	fn read_logged_reports_outcome() {
		let registry = MessageRegistry::new();
		let logger = TestLogger::new();

		let mut buffer = Vec::new();
		write(&accept_channel(), PROTOCOL_VERSION, &mut buffer).unwrap();
		registry.read_logged(&mut Cursor::new(&buffer), PROTOCOL_VERSION, &logger).unwrap();
		logger.assert_log_contains("lightning_accept_channel::ln::wire".to_owned(), "Received accept_channel for temporary channel 4242".to_owned(), 1);
		logger.assert_log_regex(
			"lightning_accept_channel::ln::wire".to_owned(),
			regex::Regex::new(r"with funding key 0[23][0-9a-f]{64}$").unwrap(),
			1,
		);

		registry.read_logged(&mut Cursor::new(&[0xff, 0xff][..]), PROTOCOL_VERSION, &logger).unwrap();
		logger.assert_log("lightning_accept_channel::ln::wire".to_owned(), "Received unknown message of type 65535".to_owned(), 1);

		// Cut off inside the TLV stream.
		buffer.truncate(buffer.len() - 1);
		let err = registry.read_logged(&mut Cursor::new(&buffer), PROTOCOL_VERSION, &logger).unwrap_err();
		assert_eq!(err, DecodeError::ShortRead);
		logger.assert_log(
			"lightning_accept_channel::ln::wire".to_owned(),
			format!("Failed to decode message: {}", DecodeError::ShortRead),
			1,
		);
	}

	#[test]
	fn is_even_message_type() {
		let message = Message::Unknown(MessageType(42));
		assert!(message.type_id().is_even());
	}

	#[test]
	fn is_odd_message_type() {
		let message = Message::Unknown(MessageType(43));
		assert!(!message.type_id().is_even());
	}
}
