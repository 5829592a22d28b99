//! Cookie files, configurations and stub executables

use catalog_dl::{Config, CookieFile, ToolsConfig};
use std::path::{Path, PathBuf};

/// Catalog host used throughout the tests
pub const CATALOG_HOST: &str = "music.apple.com";

/// A playlist URL on the catalog host
pub const PLAYLIST_URL: &str = "https://music.apple.com/us/playlist/road-trip/pl.u-123";

/// An album URL on the catalog host
pub const ALBUM_URL: &str = "https://music.apple.com/us/album/example/1234567890";

/// Netscape cookie export with a session cookie for the catalog
pub const VALID_COOKIES: &str = "# Netscape HTTP Cookie File\n\
.music.apple.com\tTRUE\t/\tTRUE\t0\tmedia-user-token\tAbC123\n\
#HttpOnly_.apple.com\tTRUE\t/\tTRUE\t0\tmyacinfo\tDeF456\n";

/// Write [`VALID_COOKIES`] to `dir/cookies.txt`
pub fn write_cookies(dir: &Path) -> PathBuf {
    let path = dir.join("cookies.txt");
    std::fs::write(&path, VALID_COOKIES).unwrap();
    path
}

/// A validated cookie file that was never read from disk
pub fn cookie_file(dir: &Path) -> CookieFile {
    CookieFile {
        path: dir.join("cookies.txt"),
        cookie_count: 2,
        catalog_cookie_count: 2,
        expires_at: None,
    }
}

/// Configuration writing under `root` that never searches PATH
pub fn isolated_config(root: &Path) -> Config {
    Config {
        output_root: root.join("downloads"),
        cookie_path: root.join("cookies.txt"),
        tools: ToolsConfig {
            search_path: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Write a TOML configuration file for the command line tests
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("catalog-dl.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

/// Write an executable `#!/bin/sh` script
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stub downloader: answers `--help`, otherwise writes `tracks` into
/// `<output-path>/Artist/<collection>/` and reports `failing` positions
/// the way the real downloader does
#[cfg(unix)]
pub fn write_stub_downloader(dir: &Path, collection: &str, tracks: &[&str], failing: &[u32]) -> PathBuf {
    let total = tracks.len();
    let mut body = String::from(
        "out=\"\"\nfor arg; do [ \"$arg\" = \"--help\" ] && exit 0; done\n\
         while [ $# -gt 0 ]; do\n  case \"$1\" in\n    --output-path) out=\"$2\"; shift 2;;\n    *) shift;;\n  esac\ndone\n",
    );
    body.push_str(&format!("dir=\"$out/Artist/{}\"\nmkdir -p \"$dir\"\n", collection));
    for (i, title) in tracks.iter().enumerate() {
        let position = i as u32 + 1;
        if failing.contains(&position) {
            body.push_str(&format!(
                "echo '[ERROR] (Track {}/{} from URL 1/1) Failed to download \"{}\": not available' >&2\n",
                position, total, title
            ));
        } else {
            body.push_str(&format!(
                "echo '[INFO] (Track {}/{} from URL 1/1) Downloading \"{}\"'\nprintf audio > \"$dir/{:02} {}.m4a\"\n",
                position, total, title, position, title
            ));
        }
    }
    write_script(dir, "gamdl", &body)
}

/// Stub ffmpeg: writes the last argument (the destination) and exits 0
#[cfg(unix)]
pub fn write_stub_ffmpeg(dir: &Path) -> PathBuf {
    write_script(dir, "ffmpeg", r#"for last; do :; done; printf flac > "$last""#)
}
