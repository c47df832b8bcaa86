//! Target framework monikers.
//!
//! A [`Framework`] is parsed from either its full name
//! (`.NETFramework,Version=v4.7.2`) or its short folder name (`net472`,
//! `netstandard2.0`, `net6.0-windows7.0`). Parsing never fails: input that
//! names no known framework becomes the [`Framework::unsupported`] sentinel,
//! which callers detect with [`Framework::is_unsupported`].

use std::fmt;
use std::hash::{Hash, Hasher};

pub mod identifiers {
    pub const NET_FRAMEWORK: &str = ".NETFramework";
    pub const NET_STANDARD: &str = ".NETStandard";
    pub const NET_CORE_APP: &str = ".NETCoreApp";
    pub const NET_PLATFORM: &str = ".NETPlatform";
    pub const NET_CORE: &str = ".NETCore";
    pub const NET_MICRO: &str = ".NETMicroFramework";
    pub const UAP: &str = "UAP";
    pub const WINDOWS: &str = "Windows";
    pub const WINDOWS_PHONE: &str = "WindowsPhone";
    pub const WINDOWS_PHONE_APP: &str = "WindowsPhoneApp";
    pub const DNX: &str = "DNX";
    pub const DNX_CORE: &str = "DNXCore";
    pub const MONO_ANDROID: &str = "MonoAndroid";
    pub const MONO_TOUCH: &str = "MonoTouch";
    pub const XAMARIN_IOS: &str = "Xamarin.iOS";
    pub const XAMARIN_MAC: &str = "Xamarin.Mac";
    pub const TIZEN: &str = "Tizen";
    pub const SILVERLIGHT: &str = "Silverlight";
    pub const UNSUPPORTED: &str = "Unsupported";
}

use identifiers as id;

/// Short folder prefix for each known identifier.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("net", id::NET_FRAMEWORK),
    ("netstandard", id::NET_STANDARD),
    ("netcoreapp", id::NET_CORE_APP),
    ("dotnet", id::NET_PLATFORM),
    ("netcore", id::NET_CORE),
    ("netmf", id::NET_MICRO),
    ("uap", id::UAP),
    ("win", id::WINDOWS),
    ("wp", id::WINDOWS_PHONE),
    ("wpa", id::WINDOWS_PHONE_APP),
    ("dnx", id::DNX),
    ("dnxcore", id::DNX_CORE),
    ("monoandroid", id::MONO_ANDROID),
    ("monotouch", id::MONO_TOUCH),
    ("xamarinios", id::XAMARIN_IOS),
    ("xamarinmac", id::XAMARIN_MAC),
    ("tizen", id::TIZEN),
    ("sl", id::SILVERLIGHT),
];

/// Short profile suffix to full profile name.
const PROFILES: &[(&str, &str)] = &[("client", "Client"), ("full", "Full"), ("cf", "CompactFramework")];

type Version4 = [u32; 4];

#[derive(Debug, Clone)]
pub struct Framework {
    identifier: String,
    version: Version4,
    profile: String,
    platform: String,
    platform_version: Version4,
}

impl Framework {
    pub fn new(identifier: &str, version: Version4) -> Self {
        Self {
            identifier: canonical_identifier(identifier).unwrap_or(identifier).to_owned(),
            version,
            profile: String::new(),
            platform: String::new(),
            platform_version: [0; 4],
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = profile.to_owned();
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: &str, platform_version: Version4) -> Self {
        self.platform = platform.to_ascii_lowercase();
        self.platform_version = platform_version;
        self
    }

    /// Sentinel for monikers that name no known framework.
    pub fn unsupported() -> Self {
        Self::new(id::UNSUPPORTED, [0; 4])
    }

    pub fn is_unsupported(&self) -> bool {
        self.identifier.eq_ignore_ascii_case(id::UNSUPPORTED)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> Version4 {
        self.version
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn platform_version(&self) -> Version4 {
        self.platform_version
    }

    pub fn has_platform(&self) -> bool {
        !self.platform.is_empty()
    }

    /// `.NETCoreApp` 5.0 and later, spelled `net5.0` and up.
    fn is_net5_era(&self) -> bool {
        self.identifier == id::NET_CORE_APP && self.version[0] >= 5
    }

    /// Parse a full name or a short folder name.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.contains(',') {
            Self::parse_full_name(text)
        } else {
            Self::parse_folder_name(text)
        }
    }

    /// Parse `.NETFramework,Version=v4.7.2[,Profile=Client]`.
    pub fn parse_full_name(text: &str) -> Self {
        let mut parts = text.split(',').map(str::trim);
        let identifier = parts.next().unwrap_or_default();
        if identifier.is_empty() || identifier.eq_ignore_ascii_case(id::UNSUPPORTED) {
            return Self::unsupported();
        }

        let mut version = None;
        let mut profile = String::new();
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Self::unsupported();
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    let value = value.trim();
                    let value = value.strip_prefix(['v', 'V']).unwrap_or(value);
                    version = parse_dotted(value);
                    if version.is_none() {
                        return Self::unsupported();
                    }
                }
                "profile" => value.trim().clone_into(&mut profile),
                _ => return Self::unsupported(),
            }
        }

        match version {
            Some(version) => Self::new(identifier, version).with_profile(&profile),
            None => Self::unsupported(),
        }
    }

    /// Parse a short folder name such as `net472` or `net6.0-windows7.0`.
    pub fn parse_folder_name(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        if lower == "unsupported" || lower.is_empty() {
            return Self::unsupported();
        }

        let letters_end = lower
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(lower.len());
        let (short, rest) = lower.split_at(letters_end);
        let Some(&(_, identifier)) = SHORT_NAMES.iter().find(|(s, _)| *s == short) else {
            return Self::unsupported();
        };

        let version_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (version_text, suffix) = rest.split_at(version_end);
        let Some(version) = parse_version_text(version_text) else {
            return Self::unsupported();
        };

        let mut framework = if identifier == id::NET_FRAMEWORK && version[0] >= 5 {
            Self::new(id::NET_CORE_APP, version)
        } else {
            Self::new(identifier, version)
        };

        if suffix.is_empty() {
            return framework;
        }
        let Some(suffix) = suffix.strip_prefix('-') else {
            return Self::unsupported();
        };
        if suffix.is_empty() {
            return Self::unsupported();
        }

        if framework.is_net5_era() {
            let platform_end = suffix
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(suffix.len());
            let (platform, platform_version) = suffix.split_at(platform_end);
            if platform.is_empty() {
                return Self::unsupported();
            }
            let Some(platform_version) = parse_version_text(platform_version) else {
                return Self::unsupported();
            };
            framework = framework.with_platform(platform, platform_version);
        } else {
            let profile = PROFILES
                .iter()
                .find(|(short, _)| *short == suffix)
                .map_or(suffix, |(_, full)| *full);
            framework = framework.with_profile(profile);
        }
        framework
    }

    /// `net472`, `netstandard2.0`, `netcoreapp3.1`, `net6.0-windows7.0`.
    pub fn short_folder_name(&self) -> String {
        if self.is_unsupported() {
            return "unsupported".to_owned();
        }

        if self.is_net5_era() {
            let mut name = format!("net{}", dotted(self.version));
            if self.has_platform() {
                name.push('-');
                name.push_str(&self.platform);
                if self.platform_version != [0; 4] {
                    name.push_str(&dotted(self.platform_version));
                }
            }
            return name;
        }

        let short = SHORT_NAMES
            .iter()
            .find(|(_, identifier)| *identifier == self.identifier)
            .map_or_else(|| self.identifier.to_ascii_lowercase(), |(s, _)| (*s).to_owned());
        let version = if self.version == [0; 4] {
            String::new()
        } else if self.identifier == id::NET_STANDARD || self.identifier == id::NET_CORE_APP {
            dotted(self.version)
        } else {
            compact(self.version)
        };

        let mut name = format!("{short}{version}");
        if !self.profile.is_empty() {
            let profile = PROFILES
                .iter()
                .find(|(_, full)| full.eq_ignore_ascii_case(&self.profile))
                .map_or_else(|| self.profile.to_ascii_lowercase(), |(s, _)| (*s).to_owned());
            name.push('-');
            name.push_str(&profile);
        }
        name
    }

    /// `.NETFramework,Version=v4.7.2`. Platforms are not part of the full name.
    pub fn dotnet_framework_name(&self) -> String {
        let mut name = format!("{},Version=v{}", self.identifier, dotted(self.version));
        if !self.profile.is_empty() {
            name.push_str(",Profile=");
            name.push_str(&self.profile);
        }
        name
    }

    /// Whether lock file targets for this framework are named by the full
    /// name: .NET Framework, .NET Standard, and .NET Core App without a
    /// platform.
    pub fn has_legacy_moniker(&self) -> bool {
        match self.identifier.as_str() {
            id::NET_FRAMEWORK | id::NET_STANDARD => true,
            id::NET_CORE_APP => !self.has_platform(),
            _ => false,
        }
    }

    fn comparison_key(&self) -> (String, Version4, String, String, Version4) {
        (
            self.identifier.to_ascii_lowercase(),
            self.version,
            self.profile.to_ascii_lowercase(),
            self.platform.clone(),
            self.platform_version,
        )
    }
}

/// Name of a restore target: the full name for frameworks with a legacy
/// moniker, the short folder name otherwise, then `/<rid>` when present.
pub fn target_name(framework: &Framework, runtime_identifier: Option<&str>) -> String {
    let base = if framework.has_legacy_moniker() {
        framework.dotnet_framework_name()
    } else {
        framework.short_folder_name()
    };
    match runtime_identifier {
        Some(rid) if !rid.is_empty() => format!("{base}/{rid}"),
        _ => base,
    }
}

/// Inverse of [`target_name`].
pub fn parse_target_name(name: &str) -> (Framework, Option<String>) {
    match name.split_once('/') {
        Some((framework, rid)) if !rid.is_empty() => {
            (Framework::parse(framework), Some(rid.to_owned()))
        }
        Some((framework, _)) => (Framework::parse(framework), None),
        None => (Framework::parse(name), None),
    }
}

fn canonical_identifier(identifier: &str) -> Option<&'static str> {
    SHORT_NAMES
        .iter()
        .map(|(_, full)| *full)
        .chain([id::UNSUPPORTED])
        .find(|full| full.eq_ignore_ascii_case(identifier))
}

/// Dotted (`4.7.2`) or compact (`472`) version text; empty means 0.0.
fn parse_version_text(text: &str) -> Option<Version4> {
    if text.is_empty() {
        return Some([0; 4]);
    }
    if text.contains('.') {
        return parse_dotted(text);
    }
    if text.len() > 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut version = [0; 4];
    for (slot, digit) in version.iter_mut().zip(text.bytes()) {
        *slot = u32::from(digit - b'0');
    }
    Some(version)
}

fn parse_dotted(text: &str) -> Option<Version4> {
    let mut version = [0; 4];
    let mut count = 0;
    for piece in text.split('.') {
        if count == 4 || piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        version[count] = piece.parse().ok()?;
        count += 1;
    }
    (count >= 2).then_some(version)
}

/// `major.minor`, plus build and revision when non-zero.
fn dotted(version: Version4) -> String {
    let len = significant_parts(version);
    version[..len]
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Digits run together when every part is a single digit, dotted otherwise.
fn compact(version: Version4) -> String {
    let len = significant_parts(version);
    if version[..len].iter().all(|part| *part < 10) {
        version[..len].iter().map(u32::to_string).collect()
    } else {
        dotted(version)
    }
}

fn significant_parts(version: Version4) -> usize {
    if version[3] != 0 {
        4
    } else if version[2] != 0 {
        3
    } else {
        2
    }
}

impl PartialEq for Framework {
    fn eq(&self, other: &Self) -> bool {
        self.comparison_key() == other.comparison_key()
    }
}

impl Eq for Framework {}

impl Hash for Framework {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.comparison_key().hash(state);
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_folder_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_folder_names() {
        let net472 = Framework::parse("net472");
        assert_eq!(net472.identifier(), id::NET_FRAMEWORK);
        assert_eq!(net472.version(), [4, 7, 2, 0]);

        let standard = Framework::parse("netstandard2.0");
        assert_eq!(standard.identifier(), id::NET_STANDARD);
        assert_eq!(standard.version(), [2, 0, 0, 0]);

        let core = Framework::parse("netcoreapp3.1");
        assert_eq!(core.identifier(), id::NET_CORE_APP);
        assert_eq!(core.version(), [3, 1, 0, 0]);
    }

    #[test]
    fn net5_and_later_map_to_core_app() {
        let net6 = Framework::parse("net6.0-windows7.0");
        assert_eq!(net6.identifier(), id::NET_CORE_APP);
        assert_eq!(net6.version(), [6, 0, 0, 0]);
        assert_eq!(net6.platform(), "windows");
        assert_eq!(net6.platform_version(), [7, 0, 0, 0]);
        assert_eq!(net6.short_folder_name(), "net6.0-windows7.0");

        assert_eq!(Framework::parse("net50").short_folder_name(), "net5.0");
        assert_eq!(Framework::parse("net8.0-android").short_folder_name(), "net8.0-android");
    }

    #[test]
    fn parses_full_names() {
        let fw = Framework::parse(".NETFramework,Version=v4.7.2");
        assert_eq!(fw, Framework::parse("net472"));

        let client = Framework::parse(".NETFramework,Version=v4.0,Profile=Client");
        assert_eq!(client.profile(), "Client");
        assert_eq!(client.short_folder_name(), "net40-client");
        assert_eq!(client, Framework::parse("net40-client"));
    }

    #[test]
    fn unknown_monikers_become_unsupported() {
        for text in ["foo1.0", "", "net4x", "portable-net45+win8", "net6.0-", ".NETFramework,Version=vX"] {
            let fw = Framework::parse(text);
            assert!(fw.is_unsupported(), "{text}");
            assert_eq!(fw, Framework::unsupported());
        }
        assert_eq!(Framework::unsupported().short_folder_name(), "unsupported");
        assert!(Framework::parse("unsupported").is_unsupported());
    }

    #[test]
    fn renders_full_names() {
        assert_eq!(
            Framework::parse("net472").dotnet_framework_name(),
            ".NETFramework,Version=v4.7.2"
        );
        assert_eq!(
            Framework::parse("netcoreapp2.0").dotnet_framework_name(),
            ".NETCoreApp,Version=v2.0"
        );
        assert_eq!(
            Framework::parse("net45").dotnet_framework_name(),
            ".NETFramework,Version=v4.5"
        );
    }

    #[test]
    fn compact_and_dotted_short_names() {
        assert_eq!(Framework::parse("dnxcore50").short_folder_name(), "dnxcore50");
        assert_eq!(Framework::parse("uap10.0").short_folder_name(), "uap10.0");
        assert_eq!(Framework::parse("net4.6.1").short_folder_name(), "net461");
        assert_eq!(Framework::parse("NetStandard1.6").short_folder_name(), "netstandard1.6");
    }

    #[test]
    fn target_names_follow_moniker_rule() {
        let windows = Framework::parse("net6.0-windows7.0");
        assert_eq!(target_name(&windows, Some("win-x64")), "net6.0-windows7.0/win-x64");
        assert_eq!(
            target_name(&Framework::parse("net472"), None),
            ".NETFramework,Version=v4.7.2"
        );
        assert_eq!(
            target_name(&Framework::parse("net6.0"), Some("linux-x64")),
            ".NETCoreApp,Version=v6.0/linux-x64"
        );
        assert_eq!(
            target_name(&Framework::parse("netstandard2.1"), Some("")),
            ".NETStandard,Version=v2.1"
        );
        assert_eq!(target_name(&Framework::parse("uap10.0"), None), "uap10.0");
    }

    #[test]
    fn target_names_parse_back() {
        for (framework, rid) in [
            ("net6.0-windows7.0", Some("win-x64")),
            ("net472", None),
            ("netcoreapp3.1", Some("osx-arm64")),
            ("uap10.0", None),
        ] {
            let fw = Framework::parse(framework);
            let name = target_name(&fw, rid);
            assert_eq!(parse_target_name(&name), (fw, rid.map(str::to_owned)));
        }
    }

    #[test]
    fn equality_ignores_identifier_case() {
        assert_eq!(
            Framework::parse(".netframework,version=v4.5"),
            Framework::parse("net45")
        );
    }
}
