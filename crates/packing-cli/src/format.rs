//! Instance and solution files.
//!
//! Text instances (`ins-N.txt`) hold the plate width, the item count, then one `w h` line
//! per item. Solutions (`out-N.txt`) hold `W H`, the item count, then `w h x y` per item
//! with effective dimensions.

use anyhow::{bail, Context, Result};
use packing_core::{Instance, Packing, Rectangle};
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

const INSTANCE_PREFIX: &str = "ins-";

/// Id of an instance file: `ins-7.txt` gives `7`, other names give their stem.
pub fn instance_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    stem.strip_prefix(INSTANCE_PREFIX).unwrap_or(stem).to_string()
}

pub fn parse_instance_text(id: &str, text: &str) -> Result<Instance> {
    let mut numbers = text.split_whitespace().enumerate().map(|(pos, token)| {
        token
            .parse::<u32>()
            .with_context(|| format!("token {} ('{}') is not a number", pos + 1, token))
    });
    let mut next = |what: &str| -> Result<u32> {
        numbers
            .next()
            .with_context(|| format!("missing {what}"))?
    };

    let plate_width = next("plate width")?;
    let count = next("item count")?;
    let rectangles = (0..count)
        .map(|i| {
            let width = next(&format!("width of item {i}"))?;
            let height = next(&format!("height of item {i}"))?;
            Ok(Rectangle::new(width, height))
        })
        .collect::<Result<Vec<_>>>()?;

    if numbers.next().is_some() {
        bail!("more than {count} items listed");
    }

    Ok(Instance::new(id, plate_width, rectangles))
}

/// Loads a text, JSON or YAML instance, chosen by file extension.
pub fn load_instance(path: &Path) -> Result<Instance> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let instance = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        _ => parse_instance_text(&instance_id(path), &content)?,
    };
    Ok(instance)
}

/// Instance files of a directory, ordered by instance number.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        let is_instance = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.starts_with(INSTANCE_PREFIX));
        let known_format = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("txt" | "json" | "yaml" | "yml")
        );
        if path.is_file() && is_instance && known_format {
            paths.push(path);
        }
    }

    paths.sort_by_cached_key(|path| {
        let id = instance_id(path);
        (id.parse::<u64>().unwrap_or(u64::MAX), id)
    });
    Ok(paths)
}

pub fn render_solution(packing: &Packing) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{} {}", packing.plate_width, packing.plate_height);
    let _ = writeln!(out, "{}", packing.placements.len());
    for p in &packing.placements {
        let _ = writeln!(out, "{} {} {} {}", p.width, p.height, p.x, p.y);
    }
    out
}

pub fn solution_path(dir: &Path, instance_id: &str) -> PathBuf {
    dir.join(format!("out-{instance_id}.txt"))
}
