// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Wire messages and the error type for decoding them live here.
//!
//! For a normal node you probably don't need to use anything here, however, if you wish to split a
//! node into an internet-facing route/message socket handling daemon and a separate daemon (or
//! server entirely) which handles only channel-related messages you may wish to decode
//! [`OpenChannel`] and [`AcceptChannel`] yourself and ship them to the channel daemon.
//!
//! Both messages end in a TLV stream whose first record, whenever the stream is non-empty, is the
//! upfront shutdown script. See [`crate::ln::script`] for the rules around it.

use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::PublicKey;
use bitcoin::SignedAmount;

use std::fmt;
use std::io;

use crate::ln::types::MilliSatoshi;
use crate::util::tlv::ExtraOpaqueData;

/// An error in decoding a message or struct.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum DecodeError {
	/// Buffer too short
	ShortRead,
	/// A public key in the message was not a valid compressed secp256k1 point
	MalformedPublicKey,
	/// The message's TLV stream was non-empty but didn't start with the upfront shutdown script
	MissingShutdownScript,
	/// Value was invalid.
	///
	/// For example, a non-canonical `BigSize`, TLV records out of order, or a shutdown script
	/// longer than [`MAX_SHUTDOWN_SCRIPT_LEN`](crate::ln::script::MAX_SHUTDOWN_SCRIPT_LEN).
	InvalidValue,
	/// Error from [`std::io`].
	Io(io::ErrorKind),
}

impl fmt::Display for DecodeError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			DecodeError::ShortRead => f.write_str("Packet extended beyond the provided bytes"),
			DecodeError::MalformedPublicKey => f.write_str("Invalid public key in packet"),
			DecodeError::MissingShutdownScript => f.write_str("No shutdown script in non-empty data blob"),
			DecodeError::InvalidValue => f.write_str("Nonsense bytes didn't map to the type they were interpreted as"),
			DecodeError::Io(ref e) => fmt::Debug::fmt(e, f),
		}
	}
}

impl std::error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
	fn from(e: io::Error) -> Self {
		if e.kind() == io::ErrorKind::UnexpectedEof {
			DecodeError::ShortRead
		} else {
			DecodeError::Io(e.kind())
		}
	}
}

/// An [`open_channel`] message to be sent to or received from a peer.
///
/// [`open_channel`]: https://github.com/lightning/bolts/blob/master/02-peer-protocol.md#the-open_channel-message
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct OpenChannel {
	/// The genesis hash of the blockchain where the channel is to be opened
	pub chain_hash: [u8; 32],
	/// A temporary channel ID, until the funding outpoint is announced
	pub temporary_channel_id: [u8; 32],
	/// The channel value
	pub funding_satoshis: SignedAmount,
	/// The amount to push to the counterparty as part of the open, in milli-satoshi
	pub push_msat: MilliSatoshi,
	/// The threshold below which outputs on transactions broadcast by sender will be omitted
	pub dust_limit: SignedAmount,
	/// The maximum inbound HTLC value in flight towards sender
	pub max_htlc_value_in_flight: MilliSatoshi,
	/// The minimum value unencumbered by HTLCs for the counterparty to keep in the channel
	pub channel_reserve: SignedAmount,
	/// The minimum HTLC size incoming to sender
	pub htlc_minimum: MilliSatoshi,
	/// The feerate per 1000-weight of sender generated transactions, until updated by update_fee
	pub feerate_per_kw: u32,
	/// The number of blocks which the counterparty will have to wait to claim on-chain funds if
	/// they broadcast a commitment transaction
	pub to_self_delay: u16,
	/// The maximum number of inbound HTLCs towards sender
	pub max_accepted_htlcs: u16,
	/// The sender's key controlling the funding transaction
	pub funding_pubkey: PublicKey,
	/// Used to derive a revocation key for transactions broadcast by counterparty
	pub revocation_basepoint: PublicKey,
	/// A payment key to sender for transactions broadcast by counterparty
	pub payment_basepoint: PublicKey,
	/// Used to derive a payment key to sender for transactions broadcast by sender
	pub delayed_payment_basepoint: PublicKey,
	/// Used to derive an HTLC payment key to sender
	pub htlc_basepoint: PublicKey,
	/// The first to-be-broadcast-by-sender transaction's per commitment point
	pub first_per_commitment_point: PublicKey,
	/// The channel flags to be used
	pub channel_flags: u8,
	/// A request to pre-set the to-sender output's `scriptPubkey` for when we collaboratively
	/// close.
	///
	/// `None` if the peer sent no TLV data at all, `Some` with an empty script if it explicitly
	/// declined to commit to an address.
	pub upfront_shutdown_script: Option<ScriptBuf>,
	/// TLV records following the shutdown script which we don't interpret
	pub extra_data: ExtraOpaqueData,
}

/// An [`accept_channel`] message to be sent to or received from a peer.
///
/// [`accept_channel`]: https://github.com/lightning/bolts/blob/master/02-peer-protocol.md#the-accept_channel-message
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct AcceptChannel {
	/// A temporary channel ID, until the funding outpoint is announced
	pub temporary_channel_id: [u8; 32],
	/// The threshold below which outputs on transactions broadcast by sender will be omitted
	pub dust_limit: SignedAmount,
	/// The maximum inbound HTLC value in flight towards sender
	pub max_htlc_value_in_flight: MilliSatoshi,
	/// The minimum value unencumbered by HTLCs for the counterparty to keep in the channel
	pub channel_reserve: SignedAmount,
	/// The minimum HTLC size incoming to sender
	pub htlc_minimum: MilliSatoshi,
	/// Minimum depth of the funding transaction before the channel is considered open
	pub minimum_depth: u32,
	/// The number of blocks which the counterparty will have to wait to claim on-chain funds if
	/// they broadcast a commitment transaction
	pub to_self_delay: u16,
	/// The maximum number of inbound HTLCs towards sender
	pub max_accepted_htlcs: u16,
	/// The sender's key controlling the funding transaction
	pub funding_pubkey: PublicKey,
	/// Used to derive a revocation key for transactions broadcast by counterparty
	pub revocation_basepoint: PublicKey,
	/// A payment key to sender for transactions broadcast by counterparty
	pub payment_basepoint: PublicKey,
	/// Used to derive a payment key to sender for transactions broadcast by sender
	pub delayed_payment_basepoint: PublicKey,
	/// Used to derive an HTLC payment key to sender for transactions broadcast by counterparty
	pub htlc_basepoint: PublicKey,
	/// The first to-be-broadcast-by-sender transaction's per commitment point
	pub first_per_commitment_point: PublicKey,
	/// A request to pre-set the to-sender output's scriptPubkey for when we collaboratively close.
	///
	/// `None` if the peer sent no TLV data at all, `Some` with an empty script if it explicitly
	/// declined to commit to an address. Both are written as a zero-length record.
	pub upfront_shutdown_script: Option<ScriptBuf>,
	/// TLV records following the shutdown script which we don't interpret
	pub extra_data: ExtraOpaqueData,
}

impl_writeable_channel_establishment_msg!(OpenChannel, 319, {
	chain_hash,
	temporary_channel_id,
	funding_satoshis,
	push_msat,
	dust_limit,
	max_htlc_value_in_flight,
	channel_reserve,
	htlc_minimum,
	feerate_per_kw,
	to_self_delay,
	max_accepted_htlcs,
	funding_pubkey,
	revocation_basepoint,
	payment_basepoint,
	delayed_payment_basepoint,
	htlc_basepoint,
	first_per_commitment_point,
	channel_flags,
});

impl_writeable_channel_establishment_msg!(AcceptChannel, 270, {
	temporary_channel_id,
	dust_limit,
	max_htlc_value_in_flight,
	channel_reserve,
	htlc_minimum,
	minimum_depth,
	to_self_delay,
	max_accepted_htlcs,
	funding_pubkey,
	revocation_basepoint,
	payment_basepoint,
	delayed_payment_basepoint,
	htlc_basepoint,
	first_per_commitment_point,
});
