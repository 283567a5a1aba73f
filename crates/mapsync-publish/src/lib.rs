// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Publishing maps whose layers are backed by datasets.
//!
//! A [`Publisher`] works on a copy of a [`Map`]'s layers. It reports whether
//! every layer is in sync with a remote table, uploads the layers that are
//! not, and forwards the final publication to a [`PublicationApi`].

pub mod error;
pub mod map;
pub mod publication;
pub mod publisher;

pub use error::{PublishError, Result};
pub use map::{Layer, Map, Source, SourceCredentials};
pub use publication::{Privacy, Publication, PublicationApi, PublishedMap};
pub use publisher::Publisher;
