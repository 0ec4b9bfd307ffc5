//! Creates a virtual keyboard and types on it.
//!
//! Without arguments, types `echo hello` followed by Enter. Otherwise, every argument is parsed as
//! a key name (`KEY_A`) or raw key code (`30`) and pressed in order.
//!
//! Needs write access to `/dev/uinput`.

use std::{env, error::Error, process, thread, time::Duration};

use keynput::{Keyboard, event::Key};

const PAUSE: Duration = Duration::from_millis(100);

fn main() {
    env_logger::init();
    match run() {
        Ok(()) => {}
        Err(e) => {
            eprintln!("\nerror: {e}");
            let mut error: &dyn Error = &*e;
            while let Some(source) = error.source() {
                eprintln!("- caused by: {source}");
                error = source;
            }
            process::exit(1);
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let keys = env::args()
        .skip(1)
        .map(|arg| parse_key(&arg))
        .collect::<Result<Vec<_>, _>>()?;
    let keys = if keys.is_empty() {
        vec![
            Key::KEY_E,
            Key::KEY_C,
            Key::KEY_H,
            Key::KEY_O,
            Key::KEY_SPACE,
            Key::KEY_H,
            Key::KEY_E,
            Key::KEY_L,
            Key::KEY_L,
            Key::KEY_O,
            Key::KEY_ENTER,
        ]
    } else {
        keys
    };

    let mut kbd = Keyboard::create("keypresses_demo")?;
    println!("created {} at {}", kbd.name(), kbd.device_node().display());

    // Give the display server a moment to pick up the new device.
    thread::sleep(PAUSE);
    for key in keys {
        println!("- {key:?}");
        kbd.press(key)?;
        thread::sleep(PAUSE);
    }

    kbd.close()?;
    Ok(())
}

fn parse_key(arg: &str) -> Result<Key, Box<dyn Error>> {
    match arg.parse::<u16>() {
        Ok(code) => Ok(Key::from_raw(code)),
        Err(_) => Ok(arg.parse::<Key>()?),
    }
}
