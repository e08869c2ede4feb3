/// Request opcodes carried in the first `i32` of every client frame.
/// Discriminants are part of the wire contract and must never
/// be renumbered once a peer build ships with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Command {
    ScanData = 0,
    ScanFile = 1,
    ScanFilesAsync = 2,
    ScanDirAsync = 3,
    ScanDirsAsync = 4,
    Cancel = 5,
    JudgeStatus = 6,
    GetDetected = 7,
    GetDetectedList = 8,
    GetIgnored = 9,
    GetIgnoredList = 10,
    CheckUrl = 11,
    EmGetName = 12,
    EmGetVendor = 13,
    EmGetVersion = 14,
    EmGetDataVersion = 15,
    EmGetUpdatedTime = 16,
    EmGetActivated = 17,
    EmGetState = 18,
    EmSetState = 19,
}

impl Command {
    pub fn from_i32(v: i32) -> Option<Self> {
        use Command::*;
        let cmd = match v {
            0 => ScanData,
            1 => ScanFile,
            2 => ScanFilesAsync,
            3 => ScanDirAsync,
            4 => ScanDirsAsync,
            5 => Cancel,
            6 => JudgeStatus,
            7 => GetDetected,
            8 => GetDetectedList,
            9 => GetIgnored,
            10 => GetIgnoredList,
            11 => CheckUrl,
            12 => EmGetName,
            13 => EmGetVendor,
            14 => EmGetVersion,
            15 => EmGetDataVersion,
            16 => EmGetUpdatedTime,
            17 => EmGetActivated,
            18 => EmGetState,
            19 => EmSetState,
            _ => return None,
        };
        Some(cmd)
    }

    /// True for the three commands that open an async event stream instead
    /// of returning a single reply.
    pub fn is_async_scan(self) -> bool {
        matches!(self, Command::ScanFilesAsync | Command::ScanDirAsync | Command::ScanDirsAsync)
    }
}

impl From<Command> for i32 {
    fn from(c: Command) -> Self {
        c as i32
    }
}

/// Events streamed after an async scan command's immediate `OK` reply.
/// The stream ends with `Complete` or is silently cut short by
/// cooperative cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AsyncEvent {
    MalwareDetected = 0,
    MalwareNone = 1,
    Complete = 2,
}

impl AsyncEvent {
    pub fn from_i32(v: i32) -> Option<Self> {
        use AsyncEvent::*;
        let ev = match v {
            0 => MalwareDetected,
            1 => MalwareNone,
            2 => Complete,
            _ => return None,
        };
        Some(ev)
    }
}

impl From<AsyncEvent> for i32 {
    fn from(e: AsyncEvent) -> Self {
        e as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_round_trips_through_i32() {
        let all = [
            Command::ScanData,
            Command::ScanFile,
            Command::ScanFilesAsync,
            Command::ScanDirAsync,
            Command::ScanDirsAsync,
            Command::Cancel,
            Command::JudgeStatus,
            Command::GetDetected,
            Command::GetDetectedList,
            Command::GetIgnored,
            Command::GetIgnoredList,
            Command::CheckUrl,
            Command::EmGetName,
            Command::EmGetVendor,
            Command::EmGetVersion,
            Command::EmGetDataVersion,
            Command::EmGetUpdatedTime,
            Command::EmGetActivated,
            Command::EmGetState,
            Command::EmSetState,
        ];
        for cmd in all {
            let v: i32 = cmd.into();
            assert_eq!(Command::from_i32(v), Some(cmd));
        }
    }

    #[test]
    fn unknown_command_is_none() {
        assert_eq!(Command::from_i32(999), None);
    }

    #[test]
    fn only_streaming_scans_are_async() {
        assert!(Command::ScanFilesAsync.is_async_scan());
        assert!(Command::ScanDirAsync.is_async_scan());
        assert!(Command::ScanDirsAsync.is_async_scan());
        assert!(!Command::ScanFile.is_async_scan());
        assert!(!Command::ScanData.is_async_scan());
    }

    #[test]
    fn async_event_round_trips_through_i32() {
        for ev in [AsyncEvent::MalwareDetected, AsyncEvent::MalwareNone, AsyncEvent::Complete] {
            let v: i32 = ev.into();
            assert_eq!(AsyncEvent::from_i32(v), Some(ev));
        }
    }
}
