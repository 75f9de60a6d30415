//! Runtime environment trust assessment.
//!
//! Aggregates device-integrity signals (root indicators, attached
//! debuggers, debug builds, unofficial install sources, emulator
//! fingerprints) into a single verdict and wipes session state on a
//! breach. Every probe is advisory and individually bypassable: the gate
//! raises cost for casual tampering and fails closed, but it cannot stop a
//! sufficiently privileged attacker.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use sable_store::SessionStore;

/// Filesystem paths where root binaries are commonly found.
const ROOT_INDICATOR_PATHS: &[&str] = &[
    "/system/app/Superuser.apk",
    "/sbin/su",
    "/system/bin/su",
    "/system/xbin/su",
    "/data/local/xbin/su",
    "/data/local/bin/su",
    "/system/sd/xbin/su",
    "/system/bin/failsafe/su",
    "/data/local/su",
    "/su/bin/su",
];

/// Package names of known root-management apps.
const ROOT_MANAGER_PACKAGES: &[&str] = &[
    "com.noshufou.android.su",
    "com.thirdparty.superuser",
    "eu.chainfire.supersu",
    "com.koushikdutta.superuser",
    "com.zachspong.temprootremovejb",
    "com.ramdroid.appquarantine",
];

/// Superuser package artifacts, in their case variants.
const SUPERUSER_ARTIFACTS: &[&str] = &[
    "/system/app/Superuser.apk",
    "/system/app/superuser.apk",
    "/system/app/SuperUser.apk",
    "/system/app/superuser/Superuser.apk",
];

/// Installer package names accepted as official.
const OFFICIAL_INSTALLERS: &[&str] = &["com.android.vending", "com.google.android.feedback"];

/// Static build description of the running device.
#[derive(Debug, Clone, Default)]
pub struct BuildInfo {
    pub fingerprint: String,
    pub model: String,
    pub manufacturer: String,
    pub brand: String,
    pub device: String,
    pub product: String,
    /// Build signing tags; `test-keys` indicates a custom ROM.
    pub tags: String,
}

/// Raw platform signals consumed by the trust checker.
///
/// A capability trait so no single platform API is hardcoded into the
/// probes: production builds supply a platform implementation, tests a
/// stub with settable signals.
pub trait DeviceEnvironment: Send + Sync {
    /// Whether a filesystem path exists.
    fn path_exists(&self, path: &Path) -> bool;

    /// Whether a package is installed on the device.
    fn has_package(&self, package: &str) -> bool;

    /// Build description of the running device.
    fn build_info(&self) -> BuildInfo;

    /// Whether a debugger is attached to the process.
    fn debugger_attached(&self) -> bool;

    /// Whether this is a debug build.
    fn debug_build(&self) -> bool;

    /// Package name of the installer, when known.
    fn installer_package(&self) -> Option<String>;
}

/// Aggregated outcome of the individual probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatVerdict {
    pub rooted: bool,
    pub debugger_attached: bool,
    pub debug_build: bool,
    pub unofficial_install: bool,
    pub emulator: bool,
    /// Debug build or emulator: development runs are exempt from the gate.
    pub development_context: bool,
}

impl ThreatVerdict {
    /// True when any probe fired outside a development context.
    pub fn is_threat(&self) -> bool {
        let any_fired = self.rooted
            || self.debugger_attached
            || self.debug_build
            || self.unofficial_install
            || self.emulator;
        any_fired && !self.development_context
    }
}

/// Aggregates device-integrity probes into a trust verdict.
pub struct TrustChecker {
    env: Arc<dyn DeviceEnvironment>,
}

impl TrustChecker {
    pub fn new(env: Arc<dyn DeviceEnvironment>) -> Self {
        Self { env }
    }

    /// Root detection across binaries, manager packages, Superuser
    /// artifacts, and build signing tags.
    pub fn is_device_rooted(&self) -> bool {
        self.check_root_binaries()
            || self.check_root_packages()
            || self.check_superuser_artifacts()
            || self.check_build_tags()
    }

    fn check_root_binaries(&self) -> bool {
        for path in ROOT_INDICATOR_PATHS {
            if self.env.path_exists(Path::new(path)) {
                warn!(path, "root binary detected");
                return true;
            }
        }
        false
    }

    fn check_root_packages(&self) -> bool {
        for package in ROOT_MANAGER_PACKAGES {
            if self.env.has_package(package) {
                warn!(package, "root management app detected");
                return true;
            }
        }
        false
    }

    fn check_superuser_artifacts(&self) -> bool {
        for path in SUPERUSER_ARTIFACTS {
            if self.env.path_exists(Path::new(path)) {
                warn!(path, "Superuser artifact detected");
                return true;
            }
        }
        false
    }

    fn check_build_tags(&self) -> bool {
        let tags = self.env.build_info().tags;
        if tags.contains("test-keys") {
            warn!("test-keys detected in build tags, possible custom ROM");
            return true;
        }
        false
    }

    /// Emulator fingerprint heuristics.
    pub fn is_emulator(&self) -> bool {
        let build = self.env.build_info();
        build.fingerprint.starts_with("generic")
            || build.fingerprint.starts_with("unknown")
            || build.model.contains("google_sdk")
            || build.model.contains("Emulator")
            || build.model.contains("Android SDK built for x86")
            || build.manufacturer.contains("Genymotion")
            || (build.brand.starts_with("generic") && build.device.starts_with("generic"))
            || build.product == "google_sdk"
    }

    /// Whether the app was installed from an official store.
    pub fn is_official_install(&self) -> bool {
        match self.env.installer_package() {
            Some(installer) => OFFICIAL_INSTALLERS.contains(&installer.as_str()),
            None => false,
        }
    }

    /// Whether the gate should treat this run as a development build.
    ///
    /// Derived from the debug-build flag or an emulator fingerprint. This
    /// is the intentional carve-out that exempts development runs from the
    /// gate.
    pub fn development_context(&self) -> bool {
        self.env.debug_build() || self.is_emulator()
    }

    /// Run every probe and aggregate the verdict.
    pub fn assess(&self) -> ThreatVerdict {
        let verdict = ThreatVerdict {
            rooted: self.is_device_rooted(),
            debugger_attached: self.env.debugger_attached(),
            debug_build: self.env.debug_build(),
            unofficial_install: !self.is_official_install(),
            emulator: self.is_emulator(),
            development_context: self.development_context(),
        };

        if verdict.development_context {
            if verdict.rooted || verdict.debugger_attached || verdict.unofficial_install {
                info!(?verdict, "threat signals tolerated in development context");
            }
        } else {
            if verdict.rooted {
                error!("root access detected");
            }
            if verdict.debugger_attached {
                error!("debugger attached to process");
            }
            if verdict.unofficial_install {
                warn!("unofficial installation source detected");
            }
        }

        verdict
    }

    /// Assess the environment and respond to a breach.
    ///
    /// On a threat verdict every session attribute is wiped (the wipe is
    /// explicit and logged, never silent) and `false` is returned.
    /// Returns `true` when the environment passed or the run is a
    /// development context.
    pub fn perform_check(&self, session: &dyn SessionStore) -> bool {
        let verdict = self.assess();

        if verdict.is_threat() {
            error!(?verdict, "security breach detected, wiping session state");
            if let Err(err) = session.clear() {
                error!(error = %err, "session wipe failed");
            }
            return false;
        }

        info!("environment check passed");
        true
    }
}

/// Production environment probing the local host.
///
/// Filesystem and procfs checks work directly; signals the host cannot
/// observe itself (package inventory, installer source, build description)
/// are injected by platform glue at construction.
pub struct HostEnvironment {
    build: BuildInfo,
    installer: Option<String>,
    packages: HashSet<String>,
}

impl HostEnvironment {
    pub fn new(
        build: BuildInfo,
        installer: Option<String>,
        packages: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            build,
            installer,
            packages: packages.into_iter().collect(),
        }
    }
}

impl DeviceEnvironment for HostEnvironment {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    fn build_info(&self) -> BuildInfo {
        self.build.clone()
    }

    fn debugger_attached(&self) -> bool {
        tracer_pid_attached()
    }

    fn debug_build(&self) -> bool {
        cfg!(debug_assertions)
    }

    fn installer_package(&self) -> Option<String> {
        self.installer.clone()
    }
}

/// Check `/proc/self/status` for a non-zero TracerPid.
#[cfg(target_os = "linux")]
fn tracer_pid_attached() -> bool {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return false;
    };
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .map(|value| value.trim().parse::<i32>().unwrap_or(0) != 0)
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn tracer_pid_attached() -> bool {
    false
}

/// Configurable environment for tests.
///
/// All signals default to absent; `trusted()` additionally reports an
/// official installer so no probe fires.
#[derive(Default)]
pub struct StubEnvironment {
    pub present_paths: HashSet<String>,
    pub packages: HashSet<String>,
    pub build: BuildInfo,
    pub debugger: bool,
    pub debug: bool,
    pub installer: Option<String>,
}

impl StubEnvironment {
    /// An environment with no threat signals.
    pub fn trusted() -> Self {
        Self {
            installer: Some("com.android.vending".to_string()),
            ..Default::default()
        }
    }
}

impl DeviceEnvironment for StubEnvironment {
    fn path_exists(&self, path: &Path) -> bool {
        self.present_paths.contains(&path.display().to_string())
    }

    fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    fn build_info(&self) -> BuildInfo {
        self.build.clone()
    }

    fn debugger_attached(&self) -> bool {
        self.debugger
    }

    fn debug_build(&self) -> bool {
        self.debug
    }

    fn installer_package(&self) -> Option<String> {
        self.installer.clone()
    }
}
