use std::io::{self, Write};
use tui_banner::{Align, Banner, Fill, Gradient, Palette};

/// Print the start-up banner
pub fn print_banner() {
    if let Ok(banner) = Banner::new("ytgrab") {
        let banner = banner
            .gradient(Gradient::diagonal(Palette::from_hex(&[
                "#FF0000",
                "#FF4040",
                "#FF8000",
                "#FFC000",
                "#FFFF00",
            ])))
            .fill(Fill::Keep)
            .align(Align::Left)
            .padding(0);
        println!("{}", banner.render());
    }

    println!(
        "  {} {}",
        console::style("YouTube Grabber").white().bold(),
        console::style("• Audio • Video • Tagged").dim()
    );
    println!();

    let _ = io::stdout().flush();
}
