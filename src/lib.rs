// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

#![crate_name = "lightning_accept_channel"]

//! Wire codec for the `accept_channel` message of the Lightning channel establishment handshake.
//!
//! `accept_channel` is the funder's counterparty's reply to `open_channel`. It carries the
//! responder's channel limits and basepoints, followed by a TLV stream which always starts with
//! the upfront shutdown script when any TLV data is present. Unknown TLV records which follow the
//! shutdown script are preserved byte-for-byte so that they survive a decode/encode cycle.
//!
//! The interesting entry points are [`ln::msgs::AcceptChannel`], the shutdown script convention
//! in [`ln::script`], and the type-code dispatch in [`ln::wire`].

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub extern crate bitcoin;

#[macro_use]
pub mod util;
pub mod ln;
