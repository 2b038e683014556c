//! # Station Feed
//!
//! Follows a live WebSocket feed of player positions and reports, for every
//! message, how far each player is from each named station on the map.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Extractor** ([`extract`]) - cuts a balanced `{ ... }` block out of
//!   JavaScript source and rewrites the relaxed object literal into JSON
//! * **Marker table** ([`markers`]) - finds the `const AREA_MARKERS = {...}`
//!   declaration and resolves each entry's coordinate layout
//! * **Receiver** ([`connection`]) - one WebSocket connection attempt, pushing
//!   raw frames into a bounded queue
//! * **Consumer** ([`consumer`]) - drains the queue, lazily loads the marker
//!   table and emits a [`DistanceReport`] per message
//! * **Supervisor** ([`supervisor`]) - pairs a receiver with a fresh consumer
//!   per attempt and reconnects after a fixed delay
//!
//! ### Message Flow
//!
//! 1. The supervisor spawns a consumer and runs the receiver
//! 2. The receiver pushes each text frame, unmodified, onto the queue
//! 3. The consumer decodes the frame, reads its `players` array and computes
//!    distances to every station with resolvable coordinates
//! 4. Reports go to a [`ReportSink`]
//! 5. When the connection ends the consumer is cancelled after a grace
//!    period; frames still queued are drained by the next consumer. A
//!    consumer that will not stop is aborted and its queue discarded
//!
//! ## Error Handling
//!
//! Errors are grouped by stage in [`error`]. A malformed message or player
//! entry is reported and skipped; a lost connection only ends the current
//! attempt.

pub use config::FeedConfig;
pub use connection::{FrameSource, WebSocketReceiver};
pub use consumer::Consumer;
pub use distance::{DistanceReport, PlayerSample, Point, StationDistances};
pub use error::{ExtractError, LoadError, MessageError, RetrievalError, StreamError};
pub use fetch::{fetcher_for, DocumentFetcher, FileFetcher, HttpFetcher};
pub use markers::{
    fetch_reference_table, load_reference_table, load_reference_table_named, MarkerCoords,
    ReferenceTable,
};
pub use report::{LogReporter, ReportSink};
pub use supervisor::Supervisor;

pub mod config;
pub mod connection;
pub mod consumer;
pub mod distance;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod markers;
pub mod report;
pub mod supervisor;

#[cfg(test)]
mod testing;
