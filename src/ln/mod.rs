// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Channel establishment messages and the wire framing around them live here.
//!
//! Build an [`msgs::AcceptChannel`] (or [`msgs::OpenChannel`]) and send it with
//! [`wire::write`]. Incoming bytes are turned back into messages by a [`wire::MessageRegistry`].

pub mod msgs;
pub mod script;
pub mod types;
pub mod wire;
