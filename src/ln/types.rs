// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Wrapper types for amounts carried in lightning messages.

use std::fmt;
use std::io::{self, Read};

use crate::ln::msgs::DecodeError;
use crate::util::ser::{Readable, Writeable, Writer};

/// An amount denominated in thousandths of a satoshi, the unit used for HTLC amounts and limits.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MilliSatoshi(pub u64);

impl MilliSatoshi {
	/// The amount in millisatoshis.
	pub fn to_msat(self) -> u64 {
		self.0
	}
}

impl From<u64> for MilliSatoshi {
	fn from(msat: u64) -> Self {
		MilliSatoshi(msat)
	}
}

impl fmt::Display for MilliSatoshi {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} mSAT", self.0)
	}
}

impl Writeable for MilliSatoshi {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		self.0.write(w)
	}
}

impl Readable for MilliSatoshi {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(MilliSatoshi(Readable::read(r)?))
	}
}
