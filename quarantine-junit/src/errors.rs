// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while reading a [`Report`](crate::Report).
///
/// Returned by [`Report::deserialize_str`](crate::Report::deserialize_str).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The document is not well-formed XML.
    #[error("invalid XML at byte offset {position}")]
    Xml {
        /// The byte offset at which the reader stopped.
        position: usize,

        /// The underlying error.
        #[source]
        err: quick_xml::Error,
    },

    /// The document does not contain a `<testsuites>` element.
    #[error("no <testsuites> element found")]
    MissingTestsuites,

    /// The document ended before an element was closed.
    #[error("unexpected end of document inside <{element}>")]
    UnexpectedEof {
        /// The element that was still open.
        element: &'static str,
    },

    /// A required attribute is missing from an element.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element.
        element: &'static str,

        /// The attribute.
        attribute: &'static str,
    },

    /// An attribute could not be parsed into its expected type.
    #[error("<{element}> attribute `{attribute}` has invalid value `{value}`")]
    InvalidAttribute {
        /// The element.
        element: &'static str,

        /// The attribute.
        attribute: &'static str,

        /// The value found in the document.
        value: String,
    },
}

impl DeserializeError {
    pub(crate) fn xml(position: usize, err: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            position,
            err: err.into(),
        }
    }
}
