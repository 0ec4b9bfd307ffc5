//! Drives the registrar through the public API with a control device defined outside the crate.

use std::{
    io,
    sync::{Arc, Mutex},
};

use keynput::{
    InputId,
    codec::{DESCRIPTOR_SIZE, DeviceDescriptor},
    control::{Command, ControlDevice},
    registrar::Registrar,
};

#[derive(Debug, Default)]
struct Log {
    writes: Vec<usize>,
    commands: Vec<Command>,
}

#[derive(Debug, Clone, Default)]
struct Shared(Arc<Mutex<Log>>);

impl ControlDevice for Shared {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.0.lock().unwrap().writes.push(record.len());
        Ok(())
    }

    fn command(&mut self, cmd: Command) -> io::Result<()> {
        self.0.lock().unwrap().commands.push(cmd);
        Ok(())
    }
}

#[test]
fn register_then_abandon() {
    let control = Shared::default();
    let log = control.0.clone();

    let descriptor = DeviceDescriptor::new("external-kbd", InputId::default()).unwrap();
    let registered = Registrar::new(control).register(descriptor).unwrap();
    assert_eq!(registered.descriptor().name(), "external-kbd");
    assert_eq!(log.lock().unwrap().commands.last(), Some(&Command::DevCreate));

    registered.abandon();
    let log = log.lock().unwrap();
    assert_eq!(log.writes, [DESCRIPTOR_SIZE]);
    assert_eq!(log.commands.last(), Some(&Command::DevDestroy));
}
