//! Colophon generates the periodic TokiStorage newsletter as PDF documents ready for legal deposit:
//! a serial issue with cover, colophon, content pages and back cover, and a QR special issue with one
//! QR code per recorded voice.
//!
//! Two pieces carry the layout. Bordered content boxes are placed through a height estimate, breaking
//! the page before a box so that it is never split (`pagination`), and externally produced PDF files
//! are spliced into a finished issue right before its back cover (`splice`).
//!
//! PDF documents are written through the struct `PdfDocument`, which is driven by the cursor-based
//! `Composer` much like a classic page-layout library.

/// The module where the `ContextError` type used throughout this library is defined.
///
/// Every fallible function returns a `Result` with this type, carrying an explanation of what failed and,
/// when the failure was propagated from another library, the message of that error.
pub mod error;

/// The module where the `PdfDocument` interface for writing PDF documents is presented.
///
/// # Introduction
///
/// Fonts are embedded whole as composite fonts with an `Identity-H` encoding and a `ToUnicode` map, so
/// that both Japanese and Latin text stay searchable. Pages collect their drawing operations until
/// `write_all` builds the page tree and the shared resources.
///
/// Documents are deterministic: the timestamps default to the Unix epoch and the identifiers are given
/// by the caller, so repeated builds produce the same bytes.
pub mod pdf;

/// Standalone faces out of font collections, and the outline format that decides how a font is embedded.
pub mod sfnt;

/// Discovery of the Japanese fonts through ordered lists of candidate paths.
pub mod fonts;

/// The cursor-based page renderer, addressing pages in millimetres from their top-left corner.
pub mod composer;

/// Height estimation of bordered content boxes and the forced page breaks placed before them.
pub mod pagination;

/// Splicing of supplementary PDF files into a base document, before its last page.
pub mod splice;

/// Conversion of slide decks to PDF through a headless office suite.
pub mod convert;

/// QR codes drawn as vector modules.
pub mod qr;

/// Volume, number and serial of an issue, and the Japanese date labels.
pub mod issue;

/// Brand colours, publication constants and the copy of the issues.
pub mod content;

pub mod config;
pub mod manifest;

/// The builders of the serial issue and of the QR special issue.
pub mod newsletter;

/// The single-page introduction brochure, in Japanese and in English.
pub mod brochure;
