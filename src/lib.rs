//! The library code for the `wotw-posts` post compiler. Each post template is
//! taken through three passes, each producing a new string:
//!
//! 1. Rendering the template ([`crate::write`]), with `highlight_block` and
//!    `source_branch_graph` available to it
//! 2. Replacing the `<!-- wotw_toc -->` placeholder with a table of contents
//!    ([`crate::toc`])
//! 3. Collapsing redundant blank lines ([`crate::whitespace`])
//!
//! The table of contents is the only involved step. Headings are found by
//! [`crate::heading`], which skips fenced code blocks, and each heading gets
//! an anchor slug from a per-document [`crate::slug::SlugRegistry`] so that
//! repeated headings still get unique anchors.
//!
//! [`crate::build::build_posts`] runs the passes over every post template
//! and writes the results to a freshly cleaned build directory.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod graph;
pub mod heading;
pub mod highlight;
pub mod slug;
pub mod toc;
pub mod util;
pub mod whitespace;
pub mod write;
