// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Progress reporting for the batch loops.
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{spinner:.yellow} [{elapsed_precise}] {prefix} {bar:32.cyan/blue} {pos}/{len} {msg}";

/// Creates a bar of `len` steps labelled with `prefix`.
pub fn batch_bar(len: usize, prefix: &'static str,) -> ProgressBar
{
    let bar = ProgressBar::new(len as u64,);
    bar.set_style(
        ProgressStyle::with_template(BAR_TEMPLATE,)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),),
    );
    bar.set_prefix(prefix,);
    bar
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn bar_tracks_length_and_prefix()
    {
        let bar = batch_bar(3, "Downloading logos",);
        bar.inc(2,);

        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 2);
        assert_eq!(bar.prefix(), "Downloading logos");
    }
}
