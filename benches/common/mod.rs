//! Common utilities for benchmarks.
//!
//! Provides patch generators with fixed seeds for reproducibility.

#![allow(dead_code)]

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Fixed seed for reproducible benchmark data
const SEED: u64 = 42;

pub fn seeded_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

/// Hunk body of `line_count` lines, a new hunk every 50 lines.
///
/// Roughly 20% added, 20% removed and 60% context lines.
pub fn generate_hunks(rng: &mut ChaCha8Rng, line_count: usize) -> String {
    let mut lines = Vec::with_capacity(line_count);
    let mut current_line = 1u32;

    lines.push(format!("@@ -1,{} +1,{} @@", line_count / 2, line_count / 2));

    for i in 1..line_count {
        if i % 50 == 0 {
            current_line += 50;
            lines.push(format!(
                "@@ -{},{} +{},{} @@ fn section_{}()",
                current_line, 30, current_line, 30, i
            ));
            continue;
        }

        let line_type: u8 = rng.random_range(0..10);
        let content = generate_code_line(rng, i);

        match line_type {
            0..=1 => lines.push(format!("+{}", content)),
            2..=3 => lines.push(format!("-{}", content)),
            _ => lines.push(format!(" {}", content)),
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One `diff --git` section for `src/module_<index>.rs`.
fn generate_file_section(rng: &mut ChaCha8Rng, index: usize, line_count: usize) -> String {
    let path = format!("src/module_{}.rs", index);
    format!(
        "diff --git a/{path} b/{path}\nindex 1111111..2222222 100644\n--- a/{path}\n+++ b/{path}\n{}",
        generate_hunks(rng, line_count)
    )
}

/// Multi-file patch with `file_count` files of `lines_per_file` hunk lines.
pub fn generate_multi_file_patch(file_count: usize, lines_per_file: usize) -> String {
    let mut rng = seeded_rng();
    (0..file_count)
        .map(|i| generate_file_section(&mut rng, i, lines_per_file))
        .collect()
}

/// Single-file patch with `line_count` hunk lines.
pub fn generate_diff_patch(line_count: usize) -> String {
    let mut rng = seeded_rng();
    generate_file_section(&mut rng, 0, line_count)
}

fn generate_code_line(rng: &mut ChaCha8Rng, line_num: usize) -> String {
    let templates = [
        "    let x = value.unwrap_or_default();",
        "    fn process_data(input: &str) -> Result<String> {",
        "    }",
        "    if condition { return Ok(()); }",
        "    for item in items.iter() {",
        "    match result {",
        "        Ok(v) => v,",
        "        Err(e) => return Err(e),",
        "    use std::collections::HashMap;",
        "    pub struct Config {",
        "    #[derive(Debug, Clone)]",
        "    // ```not a fence```",
        "    assert_eq!(expected, actual);",
        "    async fn fetch_data() -> Result<Vec<u8>> {",
        "    .map(|x| x * 2)",
    ];

    let idx = rng.random_range(0..templates.len());
    format!("{} // line {}", templates[idx], line_num)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_generate_diff_patch_length() {
        let patch = super::generate_diff_patch(100);
        // four header lines plus the hunk body
        assert_eq!(patch.lines().count(), 104);
    }

    #[test]
    fn test_generate_multi_file_patch_reproducible() {
        let patch1 = super::generate_multi_file_patch(3, 50);
        let patch2 = super::generate_multi_file_patch(3, 50);
        assert_eq!(patch1, patch2);
        assert_eq!(patch1.matches("diff --git ").count(), 3);
    }
}
