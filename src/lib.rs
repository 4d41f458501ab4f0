//! # syntra-fx
//!
//! The presentation effects of the SyntraEdge marketing site, as a
//! deterministic engine over an in-memory document and a virtual clock:
//! navigation highlighting, navbar scroll styling, scroll-triggered reveals,
//! achievement counters, testimonial cascades, timeline reveals, hero text
//! rotation, and the contact form.
//!
//! # Architecture: Host-Driven Engine
//!
//! The engine never waits on anything. A host (a browser shim, a test, or
//! the `syntra-fx` CLI) feeds it three kinds of input and reads the
//! document back:
//!
//! ```text
//! page load   →  Engine::init        nav state, reveal scan, hero, rotation
//! scroll      →  Engine::scroll_to   navbar state, visibility poll, reveals
//! time        →  Engine::advance     due timers + animation frames, in order
//! ```
//!
//! Everything deferred (a reveal delay, a counter frame, a rotation step, a
//! form request) is a [`engine::Task`] value on the [`scheduler::Scheduler`],
//! so a whole page session replays identically from the same inputs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Page engine: initialization, scroll and time input, task dispatch |
//! | [`dom`] | Element arena with classes, attributes, inline styles, layout boxes |
//! | [`selector`] | CSS selector subset used by the effects (`.a .b`, `> `, `[attr^=v]`, lists) |
//! | [`scheduler`] | Virtual event loop: timeouts, intervals, animation frames |
//! | [`watcher`] | Fire-once visibility tracking against the viewport |
//! | [`reveal`] | Scroll reveal effects and role dispatch (cards, testimonials, timeline) |
//! | [`counter`] | Achievement counter animation |
//! | [`rotator`] | Hero text rotation with a cancellation handle |
//! | [`form`] | Contact form validation, busy state, and delivery via [`form::Transport`] |
//! | [`nav`] | Active nav link, navbar scroll state, page URLs |
//! | [`config`] | `config.toml` loading, merging with stock defaults, validation |
//! | [`page`] | TOML/JSON page fixtures → [`dom::Document`] |
//! | [`render`] | HTML snapshots of a document (Maud) |
//! | [`types`] | Node handles and layout geometry |
//! | [`output`] | CLI output formatting for `simulate` and `check` |
//!
//! # Design Decisions
//!
//! ## Tasks Are Data
//!
//! The page scripts are callback soup: observers calling animators calling
//! `setTimeout` calling closures that touch the DOM. Here each effect owns its
//! state and queues plain [`engine::Task`] values; the engine routes ready
//! tasks back to the owner. No task ever holds a borrow of the document.
//!
//! ## Fail Open on Visibility
//!
//! When the host cannot report visibility (`intersection_supported = false`),
//! every observed element counts as visible on the first poll. Content is
//! never left at `opacity: 0`.
//!
//! ## Network at the Edge
//!
//! The form helper never talks to the network itself. Requests go through
//! the [`form::Transport`] trait; the CLI and the tests use
//! [`form::RecordingTransport`].

pub mod config;
pub mod counter;
pub mod dom;
pub mod engine;
pub mod form;
pub mod nav;
pub mod output;
pub mod page;
pub mod render;
pub mod reveal;
pub mod rotator;
pub mod scheduler;
pub mod selector;
pub mod types;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_helpers;
