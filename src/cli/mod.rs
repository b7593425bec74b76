//! CLI module for s3relay
//!
//! Operator commands covering every storage operation end to end:
//!
//! ```bash
//! # Print a presigned URL
//! s3relay presign GET uploads/report.docx
//!
//! # Upload a local file
//! s3relay put ./pitch.pdf docs/pitch.pdf --content-type application/pdf
//!
//! # Fetch an object (streamed to file or stdout)
//! s3relay get uploads/report.docx --output ./report.docx
//!
//! # Best-effort delete
//! s3relay rm uploads/report.docx uploads/old.docx
//!
//! # Resolve a stored reference back to its bare key
//! s3relay resolve "https://host/assets/projects/1/cover.png"
//! ```

pub mod commands;
