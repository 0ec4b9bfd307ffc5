//! Finding the device node of a freshly created device.
//!
//! `UI_DEV_CREATE` returns as soon as the kernel has registered the input device. The
//! `/dev/input/eventN` node is created asynchronously afterwards (by devtmpfs and udev), so the
//! [`Resolver`] polls the kernel's device listing until the device shows up, and then polls the
//! filesystem until its node exists.
//!
//! The device is identified by its [`InputId`] and name, among listed devices without a physical
//! path (`uinput` devices created with the legacy setup record never have one). If a previous
//! process left a device with the same identity behind, the first one in the listing wins; a
//! warning is logged naming the other candidates.
//!
//! By default, resolution blocks until the device appears. If the kernel never exposes the device
//! (for example because `evdev` is not loaded), this never returns. Use
//! [`Builder::with_timeout`][crate::Builder::with_timeout] to bound it.

use std::{
    error::Error as StdError,
    fmt, fs, io,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use crate::{Error, InputId, codec::DeviceDescriptor};

/// Default location of the kernel's textual device listing.
pub const DEVICES_LISTING_PATH: &str = "/proc/bus/input/devices";
/// Default directory holding evdev device nodes.
pub const DEV_INPUT_DIR: &str = "/dev/input";
/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Progress of a [`Resolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// The device has been created; nothing has been looked at yet.
    Registered,
    /// Waiting for the device to appear in the device listing.
    AwaitingEnumeration,
    /// The device was found in the listing; waiting for its node to exist.
    AwaitingNode(PathBuf),
    /// The device node exists.
    Ready(PathBuf),
}

/// Resolves a registered device to its `/dev/input/eventN` node.
#[derive(Debug)]
pub struct Resolver<'a> {
    descriptor: &'a DeviceDescriptor,
    listing: PathBuf,
    dev_dir: PathBuf,
    poll_interval: Duration,
    timeout: Option<Duration>,
    state: State,
}

impl<'a> Resolver<'a> {
    /// Creates a [`Resolver`] looking for `descriptor`, using the default paths and poll interval,
    /// and no timeout.
    pub fn new(descriptor: &'a DeviceDescriptor) -> Self {
        Self {
            descriptor,
            listing: PathBuf::from(DEVICES_LISTING_PATH),
            dev_dir: PathBuf::from(DEV_INPUT_DIR),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            state: State::Registered,
        }
    }

    pub fn with_listing(mut self, path: impl Into<PathBuf>) -> Self {
        self.listing = path.into();
        self
    }

    pub fn with_dev_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dev_dir = path.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Gives up with [`Error::Timeout`] if the device is not ready after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Advances the state machine by one poll without sleeping.
    ///
    /// Returns `true` once [`State::Ready`] has been reached.
    pub fn step(&mut self) -> Result<bool, Error> {
        match &self.state {
            State::Registered => {
                log::trace!("waiting for '{}' to be listed", self.descriptor.name());
                self.state = State::AwaitingEnumeration;
            }
            State::AwaitingEnumeration => {
                let listing = fs::read(&self.listing).map_err(|e| self.listing_err(e))?;
                let index = find_event_index(&listing, self.descriptor)
                    .map_err(|e| self.listing_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
                if let Some(index) = index {
                    let node = self.dev_dir.join(format!("event{index}"));
                    log::trace!("'{}' is listed as {}", self.descriptor.name(), node.display());
                    self.state = State::AwaitingNode(node);
                }
            }
            State::AwaitingNode(node) => match fs::metadata(node) {
                Ok(_) => {
                    log::debug!("'{}' is ready at {}", self.descriptor.name(), node.display());
                    self.state = State::Ready(node.clone());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            },
            State::Ready(_) => {}
        }
        Ok(matches!(self.state, State::Ready(_)))
    }

    /// Polls until the device node exists and returns its path.
    ///
    /// Blocks indefinitely unless a timeout was configured.
    pub fn resolve(mut self) -> Result<PathBuf, Error> {
        // A timeout too large to represent is as good as none.
        let deadline = self
            .timeout
            .and_then(|t| Some((Instant::now().checked_add(t)?, t)));
        loop {
            let before = self.state.clone();
            self.step()?;
            if let State::Ready(node) = &self.state {
                return Ok(node.clone());
            }
            if self.state != before {
                continue;
            }

            if let Some((deadline, timeout)) = deadline {
                if Instant::now() >= deadline {
                    log::debug!(
                        "gave up on '{}' in state {:?}",
                        self.descriptor.name(),
                        self.state
                    );
                    return Err(Error::Timeout(timeout));
                }
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn listing_err(&self, source: io::Error) -> Error {
        Error::EnumerationUnavailable {
            path: self.listing.clone(),
            source,
        }
    }
}

/// A malformed device listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingError {
    line: usize,
    msg: String,
}

impl ListingError {
    fn new(line: usize, msg: impl Into<String>) -> Self {
        Self {
            line,
            msg: msg.into(),
        }
    }
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.msg)
    }
}

impl StdError for ListingError {}

/// One stanza of the device listing, reduced to the fields needed for matching.
///
/// The kernel prints names and physical paths verbatim, so they are kept as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedDevice<'a> {
    pub id: InputId,
    pub name: &'a [u8],
    /// Empty for devices without a physical path, which includes every legacy `uinput` device.
    pub phys: &'a [u8],
    /// The `N` of the device's `eventN` handler, if it has one.
    pub event_index: Option<u32>,
}

/// Parses the contents of `/proc/bus/input/devices`.
///
/// Stanzas are separated by blank lines. Each stanza must contain an `I:` line, an `N:` line and
/// an `H:` line; any of those fields that fails to parse is an error rather than a skipped stanza.
/// Other lines are ignored.
pub fn parse_listing(listing: &[u8]) -> Result<Vec<ListedDevice<'_>>, ListingError> {
    let mut devices = Vec::new();
    let mut stanza: Vec<(usize, &[u8])> = Vec::new();
    for (i, line) in listing.split(|b| *b == b'\n').enumerate() {
        if line.trim_ascii().is_empty() {
            if !stanza.is_empty() {
                devices.push(parse_stanza(&stanza)?);
                stanza.clear();
            }
        } else {
            stanza.push((i + 1, line));
        }
    }
    if !stanza.is_empty() {
        devices.push(parse_stanza(&stanza)?);
    }
    Ok(devices)
}

fn parse_stanza<'a>(lines: &[(usize, &'a [u8])]) -> Result<ListedDevice<'a>, ListingError> {
    let first = lines.first().map_or(0, |(n, _)| *n);
    let line = |tag: &[u8]| {
        lines
            .iter()
            .find_map(|(n, line)| line.strip_prefix(tag).map(|rest| (*n, rest.trim_ascii())))
    };
    let find = |tag: &str| {
        line(tag.as_bytes())
            .ok_or_else(|| ListingError::new(first, format!("device entry has no '{tag}' line")))
    };

    let (n, ids) = find("I:")?;
    let id = parse_ids(n, text(n, ids)?)?;

    let (n, name) = find("N:")?;
    let name = name
        .strip_prefix(b"Name=\"")
        .and_then(|name| name.strip_suffix(b"\""))
        .ok_or_else(|| ListingError::new(n, format!("malformed name: {}", name.escape_ascii())))?;

    let phys = match line(b"P:") {
        Some((n, phys)) => phys.strip_prefix(b"Phys=").ok_or_else(|| {
            ListingError::new(n, format!("malformed phys: {}", phys.escape_ascii()))
        })?,
        None => &[],
    };

    let (n, handlers) = find("H:")?;
    let handlers = text(n, handlers)?;
    let handlers = handlers
        .strip_prefix("Handlers=")
        .ok_or_else(|| ListingError::new(n, format!("malformed handlers: {handlers}")))?;
    let mut event_index = None;
    for handler in handlers.split_whitespace() {
        if let Some(index) = handler.strip_prefix("event") {
            let index = index
                .parse()
                .map_err(|e| ListingError::new(n, format!("invalid handler '{handler}': {e}")))?;
            event_index.get_or_insert(index);
        }
    }

    Ok(ListedDevice {
        id,
        name,
        phys,
        event_index,
    })
}

/// Fields other than names and physical paths are plain ASCII.
fn text(n: usize, field: &[u8]) -> Result<&str, ListingError> {
    std::str::from_utf8(field)
        .map_err(|_| ListingError::new(n, format!("not ASCII: {}", field.escape_ascii())))
}

fn parse_ids(n: usize, ids: &str) -> Result<InputId, ListingError> {
    let field = |key: &str| -> Result<u16, ListingError> {
        let value = ids
            .split_whitespace()
            .find_map(|kv| kv.strip_prefix(key)?.strip_prefix('='))
            .ok_or_else(|| ListingError::new(n, format!("missing '{key}' in '{ids}'")))?;
        u16::from_str_radix(value, 16)
            .map_err(|e| ListingError::new(n, format!("invalid {key} '{value}': {e}")))
    };

    Ok(InputId::new(
        crate::Bus::from_raw(field("Bus")?),
        field("Vendor")?,
        field("Product")?,
        field("Version")?,
    ))
}

/// Looks up the event node index of the device matching `descriptor` in `listing`.
///
/// Only devices without a physical path are considered. Returns `Ok(None)` if no listed device
/// matches yet.
pub fn find_event_index(
    listing: &[u8],
    descriptor: &DeviceDescriptor,
) -> Result<Option<u32>, ListingError> {
    let devices = parse_listing(listing)?;
    let mut matches = devices.iter().filter(|dev| {
        dev.id == descriptor.input_id()
            && descriptor.name_matches(dev.name)
            && dev.phys.is_empty()
            && dev.event_index.is_some()
    });

    let Some(first) = matches.next() else {
        return Ok(None);
    };
    let others: Vec<_> = matches.filter_map(|dev| dev.event_index).collect();
    if !others.is_empty() {
        log::warn!(
            "{} devices named '{}' with {:?} are listed; using event{} and ignoring {:?}",
            others.len() + 1,
            descriptor.name(),
            descriptor.input_id(),
            first.event_index.unwrap_or_default(),
            others,
        );
    }
    Ok(first.event_index)
}

#[cfg(test)]
mod tests {
    use std::{fs::File, path::Path};

    use crate::{
        Bus,
        test::{Scratch, stanza},
    };

    use super::*;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor::new("test-kbd", InputId::default()).unwrap()
    }

    const POWER_BUTTON: &str = "\
I: Bus=0019 Vendor=0000 Product=0001 Version=0000
N: Name=\"Power Button\"
P: Phys=PNP0C0C/button/input0
S: Sysfs=/devices/LNXSYSTM:00/LNXSYBUS:00/PNP0C0C:00/input/input0
U: Uniq=
H: Handlers=kbd event0
B: PROP=0
B: EV=3
B: KEY=8000 10000000000000 0

";

    const PC_SPEAKER: &str = "\
I: Bus=0010 Vendor=001f Product=0001 Version=0100
N: Name=\"PC Speaker\"
P: Phys=isa0061/input0
S: Sysfs=/devices/platform/pcspkr/input/input5
U: Uniq=
H: Handlers=kbd
B: PROP=0
B: EV=40001
B: SND=6

";

    #[test]
    fn parse() {
        let listing = format!("{POWER_BUTTON}{PC_SPEAKER}");
        let devices = parse_listing(listing.as_bytes()).unwrap();
        assert_eq!(devices.len(), 2);

        assert_eq!(devices[0].id, InputId::new(Bus::HOST, 0, 1, 0));
        assert_eq!(devices[0].name, b"Power Button");
        assert_eq!(devices[0].phys, b"PNP0C0C/button/input0");
        assert_eq!(devices[0].event_index, Some(0));

        assert_eq!(devices[1].id, InputId::new(Bus::ISA, 0x1f, 1, 0x100));
        assert_eq!(devices[1].name, b"PC Speaker");
        assert_eq!(devices[1].event_index, None);
    }

    #[test]
    fn parse_without_trailing_blank_line() {
        let listing = stanza(3, 0x4711, 0x0815, 1, "test-kbd", 4);
        let devices = parse_listing(listing.trim_end().as_bytes()).unwrap();
        assert_eq!(devices[0].phys, b"");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].event_index, Some(4));
    }

    #[test]
    fn selects_matching_stanza() {
        let listing = format!(
            "{}{}",
            stanza(3, 0x4712, 0x0815, 1, "test-kbd", 3),
            stanza(3, 0x4711, 0x0815, 1, "test-kbd", 7),
        );
        assert_eq!(find_event_index(listing.as_bytes(), &descriptor()), Ok(Some(7)));
    }

    #[test]
    fn mismatches() {
        let d = descriptor();
        for listing in [
            stanza(6, 0x4711, 0x0815, 1, "test-kbd", 1),
            stanza(3, 0x4711, 0x0816, 1, "test-kbd", 1),
            stanza(3, 0x4711, 0x0815, 2, "test-kbd", 1),
            stanza(3, 0x4711, 0x0815, 1, "test-kbd2", 1),
            stanza(3, 0x4711, 0x0815, 1, "test", 1),
            String::new(),
        ] {
            assert_eq!(find_event_index(listing.as_bytes(), &d), Ok(None), "{listing}");
        }
    }

    #[test]
    fn first_match_wins() {
        let listing = format!(
            "{}{}{}",
            stanza(3, 0x4711, 0x0815, 1, "test-kbd", 12),
            POWER_BUTTON,
            stanza(3, 0x4711, 0x0815, 1, "test-kbd", 9),
        );
        assert_eq!(find_event_index(listing.as_bytes(), &descriptor()), Ok(Some(12)));
    }

    #[test]
    fn malformed_listing_is_an_error() {
        let d = descriptor();
        for listing in [
            "I: Bus=zz Vendor=4711 Product=0815 Version=0001\nN: Name=\"x\"\nH: Handlers=event1\n",
            "I: Bus=0003 Vendor=4711 Product=0815\nN: Name=\"x\"\nH: Handlers=event1\n",
            "I: Bus=0003 Vendor=4711 Product=0815 Version=0001\nN: Name=x\nH: Handlers=event1\n",
            "I: Bus=0003 Vendor=4711 Product=0815 Version=0001\nN: Name=\"x\"\nH: Handlers=eventX\n",
            "I: Bus=0003 Vendor=4711 Product=0815 Version=0001\nN: Name=\"x\"\n",
            "N: Name=\"x\"\nH: Handlers=event1\n",
            "I: Bus=10003 Vendor=4711 Product=0815 Version=0001\nN: Name=\"x\"\nH: Handlers=event1\n",
        ] {
            assert!(find_event_index(listing.as_bytes(), &d).is_err(), "{listing}");
        }

        // A malformed unrelated stanza also aborts the lookup.
        let listing = format!(
            "{}I: Bus=0003 Vendor=47g1 Product=0815 Version=0001\nN: Name=\"x\"\nH: Handlers=\n",
            stanza(3, 0x4711, 0x0815, 1, "test-kbd", 7),
        );
        let err = find_event_index(listing.as_bytes(), &d).unwrap_err();
        assert_eq!(err.line, 11);
    }

    #[test]
    fn foreign_names_are_bytes() {
        let mut listing = b"\
I: Bus=0003 Vendor=046d Product=c52b Version=0111
N: Name=\"Logi \xe9\"
P: Phys=usb-0000:00:14.0-2/input2
H: Handlers=kbd event2

"
        .to_vec();
        listing.extend_from_slice(stanza(3, 0x4711, 0x0815, 1, "test-kbd", 5).as_bytes());

        let devices = parse_listing(&listing).unwrap();
        assert_eq!(devices[0].name, b"Logi \xe9");
        assert_eq!(find_event_index(&listing, &descriptor()), Ok(Some(5)));
    }

    #[test]
    fn devices_with_phys_are_skipped() {
        let real = stanza(3, 0x4711, 0x0815, 1, "test-kbd", 3)
            .replace("P: Phys=\n", "P: Phys=usb-0000:00:14.0-1/input0\n");
        let listing = format!("{real}{}", stanza(3, 0x4711, 0x0815, 1, "test-kbd", 7));
        assert_eq!(find_event_index(listing.as_bytes(), &descriptor()), Ok(Some(7)));
        assert_eq!(find_event_index(real.as_bytes(), &descriptor()), Ok(None));
    }

    #[test]
    fn resolve_ready() -> Result<(), Error> {
        let scratch = Scratch::new().map_err(Error::Io)?;
        let listing = scratch
            .write("devices", &stanza(3, 0x4711, 0x0815, 1, "test-kbd", 5))
            .map_err(Error::Io)?;
        File::create(scratch.path().join("event5")).map_err(Error::Io)?;

        let d = descriptor();
        let node = Resolver::new(&d)
            .with_listing(&listing)
            .with_dev_dir(scratch.path())
            .resolve()?;
        assert_eq!(node, scratch.path().join("event5"));
        Ok(())
    }

    #[test]
    fn state_machine() -> Result<(), Error> {
        let scratch = Scratch::new().map_err(Error::Io)?;
        let listing = scratch.write("devices", POWER_BUTTON).map_err(Error::Io)?;
        let d = descriptor();
        let mut resolver = Resolver::new(&d)
            .with_listing(&listing)
            .with_dev_dir(scratch.path());
        assert_eq!(*resolver.state(), State::Registered);

        assert!(!resolver.step()?);
        assert_eq!(*resolver.state(), State::AwaitingEnumeration);
        assert!(!resolver.step()?);
        assert_eq!(*resolver.state(), State::AwaitingEnumeration);

        let node = scratch.path().join("event2");
        scratch
            .write(
                "devices",
                &format!("{POWER_BUTTON}{}", stanza(3, 0x4711, 0x0815, 1, "test-kbd", 2)),
            )
            .map_err(Error::Io)?;
        assert!(!resolver.step()?);
        assert_eq!(*resolver.state(), State::AwaitingNode(node.clone()));
        assert!(!resolver.step()?);
        assert_eq!(*resolver.state(), State::AwaitingNode(node.clone()));

        File::create(&node).map_err(Error::Io)?;
        assert!(resolver.step()?);
        assert_eq!(*resolver.state(), State::Ready(node));
        Ok(())
    }

    #[test]
    fn timeout_while_unlisted() -> Result<(), Error> {
        let scratch = Scratch::new().map_err(Error::Io)?;
        let listing = scratch.write("devices", POWER_BUTTON).map_err(Error::Io)?;
        let d = descriptor();
        let err = Resolver::new(&d)
            .with_listing(&listing)
            .with_timeout(Some(Duration::from_millis(20)))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(t) if t == Duration::from_millis(20)));
        Ok(())
    }

    #[test]
    fn timeout_while_node_missing() -> Result<(), Error> {
        let scratch = Scratch::new().map_err(Error::Io)?;
        let listing = scratch
            .write("devices", &stanza(3, 0x4711, 0x0815, 1, "test-kbd", 5))
            .map_err(Error::Io)?;
        let d = descriptor();
        let err = Resolver::new(&d)
            .with_listing(&listing)
            .with_dev_dir(scratch.path())
            .with_poll_interval(Duration::from_millis(2))
            .with_timeout(Some(Duration::from_millis(20)))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        Ok(())
    }

    #[test]
    fn unrepresentable_timeout() -> Result<(), Error> {
        let scratch = Scratch::new().map_err(Error::Io)?;
        let listing = scratch
            .write("devices", stanza(3, 0x4711, 0x0815, 1, "test-kbd", 5))
            .map_err(Error::Io)?;
        File::create(scratch.path().join("event5")).map_err(Error::Io)?;

        let d = descriptor();
        let node = Resolver::new(&d)
            .with_listing(&listing)
            .with_dev_dir(scratch.path())
            .with_timeout(Some(Duration::MAX))
            .resolve()?;
        assert_eq!(node, scratch.path().join("event5"));
        Ok(())
    }

    #[test]
    fn unreadable_listing() {
        let d = descriptor();
        let err = Resolver::new(&d)
            .with_listing("/nonexistent/devices")
            .resolve()
            .unwrap_err();
        match err {
            Error::EnumerationUnavailable { path, source } => {
                assert_eq!(path, Path::new("/nonexistent/devices"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn unparsable_listing() -> Result<(), Error> {
        let scratch = Scratch::new().map_err(Error::Io)?;
        let listing = scratch
            .write("devices", "I: Bus=0003\nN: Name=\"x\"\nH: Handlers=\n")
            .map_err(Error::Io)?;
        let d = descriptor();
        let err = Resolver::new(&d).with_listing(&listing).resolve().unwrap_err();
        match err {
            Error::EnumerationUnavailable { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            e => panic!("unexpected error {e:?}"),
        }
        Ok(())
    }
}
