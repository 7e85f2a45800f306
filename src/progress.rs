use indicatif::{ProgressBar, ProgressStyle};

pub fn batch_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(batch_bar_style());
    bar.set_prefix("fingerprint");
    bar
}

fn batch_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:<11} {bar:40.cyan/blue} {percent:>3}% {pos}/{len} images [{elapsed_precise}<{eta_precise}] {msg}",
    )
    .map(|style| style.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}
