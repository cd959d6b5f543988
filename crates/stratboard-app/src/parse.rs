//! Argument parsers for coordinates, sizes and shell lines.

use anyhow::{Context, Result, bail};
use stratboard_core::{NodeSize, Position};

fn pair(s: &str, separators: &[char]) -> Result<(f64, f64)> {
    let (a, b) = s
        .split_once(|c| separators.contains(&c))
        .with_context(|| format!("expected two numbers in '{}'", s))?;
    let a: f64 = a.trim().parse().with_context(|| format!("bad number '{}'", a))?;
    let b: f64 = b.trim().parse().with_context(|| format!("bad number '{}'", b))?;
    if !a.is_finite() || !b.is_finite() {
        bail!("coordinates must be finite");
    }
    Ok((a, b))
}

/// `X,Y`
pub fn parse_position(s: &str) -> Result<Position> {
    let (x, y) = pair(s, &[','])?;
    Ok(Position::new(x, y))
}

/// `WxH` or `W,H`
pub fn parse_size(s: &str) -> Result<NodeSize> {
    let (w, h) = pair(s, &['x', 'X', ','])?;
    if w <= 0.0 || h <= 0.0 {
        bail!("size must be positive");
    }
    Ok(NodeSize::new(w, h))
}

/// Split a shell line into words. Single and double quotes group words,
/// a backslash escapes the next character.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                let next = chars.next().context("dangling backslash")?;
                current.push(match next {
                    'n' if quote.is_some() => '\n',
                    other => other,
                });
                in_word = true;
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
