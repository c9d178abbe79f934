//! Compaction of asset content before storage and bundling.
//!
//! Scripts go through the oxc minifier, stylesheets through lightningcss.
//! Compaction must be a pure, deterministic function of the input bytes and
//! the asset kind: the per-file object and the bundle both hold its output,
//! and the orchestrator assumes re-running it would yield the same bytes.

use crate::models::asset_kind::AssetKind;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Reduces asset content before it is stored and bundled.
pub trait Compactor: Send + Sync {
    /// Compact `input` according to `kind`. Content that cannot be compacted
    /// (unbundled kinds, non-UTF-8 bytes, unparseable source) comes back
    /// unchanged; this function never fails.
    fn compact(&self, input: &[u8], kind: AssetKind) -> Vec<u8>;
}

/// Production compactor backed by oxc (scripts) and lightningcss (styles).
#[derive(Clone, Copy, Debug, Default)]
pub struct AssetPacker;

impl Compactor for AssetPacker {
    fn compact(&self, input: &[u8], kind: AssetKind) -> Vec<u8> {
        let packed = match kind {
            AssetKind::Script => std::str::from_utf8(input).ok().and_then(pack_script),
            AssetKind::Style => std::str::from_utf8(input).ok().and_then(pack_style),
            AssetKind::Other => None,
        };
        match packed {
            Some(code) => code.into_bytes(),
            None => input.to_vec(),
        }
    }
}

/// Minify JavaScript source. Returns `None` when the source does not parse.
fn pack_script(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !parsed.errors.is_empty() {
        return None;
    }
    let mut program = parsed.program;
    let minified = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    })
    .minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source. Returns `None` when the stylesheet does not parse.
fn pack_style(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(printed.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_shrink_and_stay_utf8() {
        let source = b"export function add(first, second) {\n    return first + second;\n}\n";
        let packed = AssetPacker.compact(source, AssetKind::Script);
        assert!(packed.len() < source.len());
        assert!(std::str::from_utf8(&packed).is_ok());
    }

    #[test]
    fn styles_shrink_and_lose_whitespace() {
        let source = b"body {\n    color: #ffffff;\n    margin: 0px;\n}\n";
        let packed = AssetPacker.compact(source, AssetKind::Style);
        assert!(packed.len() < source.len());
        let text = std::str::from_utf8(&packed).unwrap();
        assert!(text.contains("body{"));
    }

    #[test]
    fn other_kinds_pass_through_untouched() {
        let bytes = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        let packed = AssetPacker.compact(&bytes, AssetKind::Other);
        assert_eq!(packed, bytes);
    }

    #[test]
    fn unparseable_script_falls_back_to_input() {
        let source = b"function {{{ nope";
        let packed = AssetPacker.compact(source, AssetKind::Script);
        assert_eq!(packed, source);
    }

    #[test]
    fn non_utf8_input_falls_back_to_input() {
        let bytes = [0xff, 0xfe, b'a'];
        let packed = AssetPacker.compact(&bytes, AssetKind::Script);
        assert_eq!(packed, bytes);
    }

    #[test]
    fn compaction_is_deterministic() {
        let source = b"const answer = 40 + 2; export { answer };";
        let first = AssetPacker.compact(source, AssetKind::Script);
        let second = AssetPacker.compact(source, AssetKind::Script);
        assert_eq!(first, second);
    }
}
