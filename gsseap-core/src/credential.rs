//! Credential data model (spec §3). Loading a RadSec config file is out of
//! scope; only the reference fields are carried (spec's AMBIENT STACK
//! "Configuration" note).

use std::sync::Mutex;

use crate::name::Name;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct CredentialUsage: u32 {
        const INITIATE = 0x1;
        const ACCEPT   = 0x2;
        const BOTH     = Self::INITIATE.bits() | Self::ACCEPT.bits();
    }
}

/// Reauthentication credential: opaque per spec §9 (trait-object boundary,
/// "the other mechanism", replacing `dlsym(RTLD_NEXT, ...)`).
pub trait ReauthMechanism: Send {
    fn mechanism_oid(&self) -> &[u8];
}

struct CredentialInner {
    name: Name,
    password: Option<Vec<u8>>,
    usage: CredentialUsage,
    mechanisms: Vec<Vec<u8>>,
    expiry: Option<u64>,
    radius_config_file: Option<String>,
    radius_config_stanza: Option<String>,
    reauth: Option<Box<dyn ReauthMechanism>>,
}

/// A caller's credential, guarded by its own mutex (spec §5: acquired
/// strictly after the owning context's mutex, never before).
pub struct Credential {
    inner: Mutex<CredentialInner>,
}

impl Credential {
    pub fn new(name: Name, usage: CredentialUsage, mechanisms: Vec<Vec<u8>>) -> Self {
        Self {
            inner: Mutex::new(CredentialInner {
                name,
                password: None,
                usage,
                mechanisms,
                expiry: None,
                radius_config_file: None,
                radius_config_stanza: None,
                reauth: None,
            }),
        }
    }

    pub fn with_password(self, password: Vec<u8>) -> Self {
        self.inner.lock().expect("credential mutex poisoned").password = Some(password);
        self
    }

    pub fn with_radius_config(self, file: impl Into<String>, stanza: impl Into<String>) -> Self {
        {
            let mut inner = self.inner.lock().expect("credential mutex poisoned");
            inner.radius_config_file = Some(file.into());
            inner.radius_config_stanza = Some(stanza.into());
        }
        self
    }

    pub fn name(&self) -> Name {
        self.inner.lock().expect("credential mutex poisoned").name.clone()
    }

    pub fn usage(&self) -> CredentialUsage {
        self.inner.lock().expect("credential mutex poisoned").usage
    }

    pub fn supports_mechanism(&self, oid: &[u8]) -> bool {
        self.inner
            .lock()
            .expect("credential mutex poisoned")
            .mechanisms
            .iter()
            .any(|m| m.as_slice() == oid)
    }

    pub fn password(&self) -> Option<Vec<u8>> {
        self.inner.lock().expect("credential mutex poisoned").password.clone()
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.inner
            .lock()
            .expect("credential mutex poisoned")
            .expiry
            .is_some_and(|exp| now >= exp)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("credential mutex poisoned");
        f.debug_struct("Credential")
            .field("name", &inner.name)
            .field("usage", &inner.usage)
            .field("password", &inner.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
