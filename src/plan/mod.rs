// ABOUTME: Training plan handling: decoding backend output and writing it to the calendar
// ABOUTME: Parsing is strict; writing tolerates individual bad entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Plan decoding
pub mod parser;
/// Calendar writes
pub mod writer;

pub use parser::{parse_plan, strip_code_fences};
pub use writer::PlanWriter;
