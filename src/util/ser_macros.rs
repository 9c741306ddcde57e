// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Some macros that implement [`Readable`]/[`Writeable`] traits for lightning messages.
//!
//! [`Readable`]: crate::util::ser::Readable
//! [`Writeable`]: crate::util::ser::Writeable

/// Implements [`Readable`]/[`Writeable`] for a channel establishment message.
///
/// The listed fields are written in order, followed by a u16-length-prefixed TLV stream holding
/// the message's `upfront_shutdown_script` and `extra_data` as laid out by
/// [`pack_shutdown_script`]. `$fixed_len` is the combined length of the listed fields and is
/// exposed as `FIXED_FIELDS_LEN`.
///
/// The TLV stream is built and length-checked before anything is written, so a message which
/// cannot be packed leaves the writer untouched.
///
/// [`Readable`]: crate::util::ser::Readable
/// [`Writeable`]: crate::util::ser::Writeable
/// [`pack_shutdown_script`]: crate::ln::script::pack_shutdown_script
macro_rules! impl_writeable_channel_establishment_msg {
	($st:ident, $fixed_len: expr, {$($field:ident),* $(,)*}) => {
		impl $st {
			/// The number of bytes occupied by the fixed-order fields preceding the TLV stream.
			pub const FIXED_FIELDS_LEN: usize = $fixed_len;
		}

		impl $crate::util::ser::Writeable for $st {
			fn write<W: $crate::util::ser::Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
				let tlv_records = $crate::ln::script::pack_shutdown_script(
					self.upfront_shutdown_script.as_ref(), &self.extra_data,
				)?;
				$( $crate::util::ser::Writeable::write(&self.$field, w)?; )*
				$crate::util::ser::Writeable::write(&tlv_records, w)
			}
		}

		impl $crate::util::ser::Readable for $st {
			fn read<R: ::std::io::Read>(r: &mut R) -> Result<Self, $crate::ln::msgs::DecodeError> {
				$( let $field = $crate::util::ser::Readable::read(r)?; )*
				let tlv_records: Vec<u8> = $crate::util::ser::Readable::read(r)?;
				let (upfront_shutdown_script, extra_data) =
					$crate::ln::script::parse_shutdown_script(&tlv_records)?;
				Ok(Self {
					$($field,)*
					upfront_shutdown_script,
					extra_data,
				})
			}
		}
	}
}
