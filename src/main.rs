use log::LevelFilter;
use std::env;
use std::error::Error;

use chip8_view::app::{self, App};
use chip8_view::config::Config;
use chip8_view::display::TermDisplay;
use chip8_view::input::TermInput;
use chip8_view::listing::ListingMachine;
use chip8_view::report;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_args(&args)?;
    report::init(LevelFilter::Info)?;

    let mut app = App::new(ListingMachine::new(), &config);
    // NB. a bad catalog is already in the messages panel; carry on without one
    let _ = app.selector_mut().load_catalog(&config.catalog);

    let mut input = TermInput::new()?;
    let mut display = TermDisplay::new()?;
    app::run(&mut app, &mut display, &mut input, config.frame_duration())?;
    Ok(())
}
