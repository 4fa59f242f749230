//! Script-free rendering of a flicker stream as CSS keyframe animations.
//!
//! Each bar gets its own `@keyframes` block that only contains the frames
//! where that bar changes, animated with `step-end` so colours switch hard.

use std::fmt::Write;

use crate::encoder::{EncodedStream, StateCode, BAR_COUNT};

/// Frame time used by the static stylesheet.
pub const DEFAULT_FRAME_MS: f64 = 25.0;

const LIT: &str = "#fff";
const DARK: &str = "#000";

/// Keyframe steps for one bar: `(percent, lit)` at every change.
pub fn bar_steps(stream: &EncodedStream, bar: usize) -> Vec<(f64, bool)> {
    let per_frame = 100.0 / stream.len() as f64;
    let mut previous: Option<StateCode> = None;
    let mut steps = Vec::new();

    for (index, code) in stream.iter().enumerate() {
        let changed = previous.map_or(true, |last| last.bar(bar) != code.bar(bar));
        if changed {
            steps.push((index as f64 * per_frame, code.bar(bar)));
        }
        previous = Some(code);
    }
    steps
}

/// Renders the complete stylesheet for one stream. `css_class` scopes the
/// animation to a single flicker element.
pub fn render_keyframes(stream: &EncodedStream, css_class: &str, frame_ms: f64) -> String {
    let duration_s = frame_ms * stream.len() as f64 / 1000.0;
    let mut css = String::new();

    for bar in 0..BAR_COUNT {
        let frames: Vec<String> = bar_steps(stream, bar)
            .into_iter()
            .map(|(percent, lit)| {
                format!(
                    "{percent}% {{ background-color: {}; }}",
                    if lit { LIT } else { DARK }
                )
            })
            .collect();
        // Writing into a String cannot fail.
        let _ = writeln!(css, "@keyframes {css_class}-bar-{bar} {{ {} }}", frames.join(" "));
    }

    let _ = writeln!(
        css,
        ".flicker-animate-css .flicker-bar {{\n    \
         animation-duration: {duration_s}s;\n    \
         animation-iteration-count: infinite;\n    \
         animation-timing-function: step-end;\n}}"
    );
    for bar in 0..BAR_COUNT {
        let _ = writeln!(
            css,
            ".flicker-animate-css.{css_class} .flicker-bar-{bar} {{\n    \
             animation-name: {css_class}-bar-{bar};\n}}"
        );
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    #[test]
    fn preamble_clock_bar_toggles_every_frame() {
        let stream = encode("").unwrap();
        let clock = bar_steps(&stream, 0);
        let lit: Vec<bool> = clock.iter().map(|(_, lit)| *lit).collect();
        assert_eq!(lit, vec![true, false, true, false, true, false]);

        let data = bar_steps(&stream, 1);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0], (0.0, false));
        assert!(data[1].1);
        assert!((data[1].0 - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn stylesheet_scopes_every_bar() {
        let stream = encode("0a").unwrap();
        let css = render_keyframes(&stream, "flicker-abc", DEFAULT_FRAME_MS);

        for bar in 0..BAR_COUNT {
            assert!(css.contains(&format!("@keyframes flicker-abc-bar-{bar} {{")));
            assert!(css.contains(&format!(
                ".flicker-animate-css.flicker-abc .flicker-bar-{bar} {{"
            )));
        }
        assert!(css.contains("animation-duration: 0.25s;"));
        assert!(css.contains("step-end"));
    }
}
