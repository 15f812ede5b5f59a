//! Context state and negotiated GSS flags, both expressed as bitflags so a
//! dispatcher handler can declare the set of states in which it runs
//! (spec §3: "State values are bit-flags").

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct State: u32 {
        const INITIAL         = 0x01;
        const AUTHENTICATE    = 0x02;
        const INITIATOR_EXTS  = 0x04;
        const ACCEPTOR_EXTS   = 0x08;
        const ESTABLISHED     = 0x10;
        /// Alternate branch from `INITIAL` for fast reauthentication.
        const REAUTHENTICATE  = 0x20;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct GssFlags: u32 {
        const TRANS    = 0x01;
        const INTEG    = 0x02;
        const CONF     = 0x04;
        const SEQUENCE = 0x08;
        const REPLAY   = 0x10;
        const MUTUAL   = 0x20;
    }
}

impl GssFlags {
    /// The set every freshly allocated context advertises (spec §4.9).
    pub fn advertised_default() -> Self {
        Self::TRANS | Self::INTEG | Self::CONF | Self::SEQUENCE | Self::REPLAY
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Role {
    Initiator,
    Acceptor,
}

impl State {
    /// Lifecycle ordering used by the dispatcher (C8) to detect a reauth
    /// rollback: a handler that leaves the context at an earlier rank than
    /// it started restarts the handler-table walk. `REAUTHENTICATE` ranks
    /// alongside `INITIAL` since it is an alternate entry into the same
    /// walk, not a forward step.
    pub fn rank(self) -> u8 {
        if self.contains(Self::ESTABLISHED) {
            4
        } else if self.contains(Self::ACCEPTOR_EXTS) {
            3
        } else if self.contains(Self::INITIATOR_EXTS) {
            2
        } else if self.contains(Self::AUTHENTICATE) {
            1
        } else {
            0
        }
    }
}
