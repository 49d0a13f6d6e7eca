// Copyright 2017 ThetaSinner
//
// This file is part of Osmium.

// Osmium is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Osmium is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Osmium. If not, see <http://www.gnu.org/licenses/>.

// std
use std::fmt;
use std::slice;

// Per entry overhead used by hpack when sizing the dynamic table (4.1).
const HEADER_ENTRY_OVERHEAD: usize = 32;

#[derive(Clone, PartialEq, Debug)]
pub enum HeaderName {
    PseudoPath,
    PseudoMethod,
    PseudoScheme,
    PseudoAuthority,
    PseudoStatus,
    ContentLength,
    ContentType,
    CustomHeader(String)
}

impl HeaderName {
    pub fn as_str(&self) -> &str {
        match *self {
            HeaderName::PseudoPath => ":path",
            HeaderName::PseudoMethod => ":method",
            HeaderName::PseudoScheme => ":scheme",
            HeaderName::PseudoAuthority => ":authority",
            HeaderName::PseudoStatus => ":status",
            HeaderName::ContentLength => "content-length",
            HeaderName::ContentType => "content-type",
            HeaderName::CustomHeader(ref name) => name.as_str()
        }
    }
}

// Header names arrive lower case over http2 (8.1.2), anything unknown is kept as a custom header.
impl<'a> From<&'a str> for HeaderName {
    fn from(name: &str) -> Self {
        match name {
            ":path" => HeaderName::PseudoPath,
            ":method" => HeaderName::PseudoMethod,
            ":scheme" => HeaderName::PseudoScheme,
            ":authority" => HeaderName::PseudoAuthority,
            ":status" => HeaderName::PseudoStatus,
            "content-length" => HeaderName::ContentLength,
            "content-type" => HeaderName::ContentType,
            _ => HeaderName::CustomHeader(String::from(name))
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum HeaderValue {
    Str(String),
    Num(i32)
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HeaderValue::Str(ref s) => write!(f, "{}", s),
            HeaderValue::Num(ref n) => write!(f, "{}", n)
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Header {
    pub name: HeaderName,
    pub value: HeaderValue
}

impl Header {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Header {
            name: name,
            value: value
        }
    }

    pub fn get_octet_size(&self) -> usize {
        self.name.as_str().len() + self.value.to_string().len() + HEADER_ENTRY_OVERHEAD
    }
}

/// A decoded header block, in the order the fields appeared on the wire.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct HeaderList {
    headers: Vec<Header>
}

impl HeaderList {
    pub fn new() -> Self {
        HeaderList {
            headers: Vec::new()
        }
    }

    pub fn push_header(&mut self, header: Header) {
        self.headers.push(header);
    }

    pub fn push(&mut self, name: HeaderName, value: HeaderValue) {
        self.push_header(Header::new(name, value));
    }

    pub fn iter(&self) -> slice::Iter<Header> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// An estimate of the space the list takes up, used for write buffer accounting.
    pub fn get_octet_size(&self) -> usize {
        self.headers.iter().map(|header| header.get_octet_size()).sum()
    }
}
