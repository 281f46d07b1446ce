use std::env;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::backend::common::dtos::{IdeConfig, IdeKind};

const JETBRAINS_PRODUCTS: &[&str] = &[
    "IntelliJ IDEA",
    "PyCharm",
    "WebStorm",
    "CLion",
    "GoLand",
    "RustRover",
    "Rider",
];

/// Best-effort scan of common install locations. Absent IDEs are simply
/// missing from the result; this never fails.
pub(crate) fn list_supported() -> Vec<IdeConfig> {
    let mut found = Vec::new();
    if let Some(vscode) = find_vscode() {
        found.push(vscode);
    }
    found.extend(find_jetbrains());
    found
}

fn find_vscode() -> Option<IdeConfig> {
    let candidates = vscode_candidates();
    let exe = candidates.into_iter().find(|p| p.is_file())?;
    Some(IdeConfig {
        kind: IdeKind::Vscode,
        name: "Visual Studio Code".to_string(),
        exe_path: exe.to_string_lossy().to_string(),
        args: Some(vec!["{path}".to_string()]),
    })
}

fn vscode_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from(
            "/Applications/Visual Studio Code.app/Contents/Resources/app/bin/code",
        ));
    } else if cfg!(target_os = "windows") {
        if let Some(local) = env::var_os("LOCALAPPDATA") {
            candidates.push(
                PathBuf::from(local)
                    .join("Programs")
                    .join("Microsoft VS Code")
                    .join("bin")
                    .join("code.cmd"),
            );
        }
    } else {
        candidates.push(PathBuf::from("/usr/bin/code"));
        candidates.push(PathBuf::from("/usr/local/bin/code"));
        candidates.push(PathBuf::from("/snap/bin/code"));
    }
    if let Some(path_var) = env::var_os("PATH") {
        let exe_name = if cfg!(target_os = "windows") {
            "code.cmd"
        } else {
            "code"
        };
        for dir in env::split_paths(&path_var) {
            candidates.push(dir.join(exe_name));
        }
    }
    candidates
}

fn find_jetbrains() -> Vec<IdeConfig> {
    let mut found = Vec::new();
    for root in jetbrains_roots() {
        if !root.is_dir() {
            continue;
        }
        // Shallow walk: product dirs sit directly under the vendor root.
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .flatten()
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(product) = JETBRAINS_PRODUCTS
                .iter()
                .find(|product| name.starts_with(*product))
            else {
                continue;
            };
            if let Some(exe) = jetbrains_launcher(entry.path()) {
                found.push(IdeConfig {
                    kind: IdeKind::Jetbrains,
                    name: (*product).to_string(),
                    exe_path: exe.to_string_lossy().to_string(),
                    args: Some(vec!["{path}".to_string()]),
                });
            }
        }
    }
    found
}

fn jetbrains_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if cfg!(target_os = "macos") {
        roots.push(PathBuf::from("/Applications"));
    } else if cfg!(target_os = "windows") {
        if let Some(program_files) = env::var_os("ProgramFiles") {
            roots.push(PathBuf::from(program_files).join("JetBrains"));
        }
    } else if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".local/share/JetBrains/Toolbox/apps"));
        roots.push(PathBuf::from("/opt"));
    }
    roots
}

fn jetbrains_launcher(product_dir: &Path) -> Option<PathBuf> {
    let bin = product_dir.join("bin");
    if !bin.is_dir() {
        return None;
    }
    for entry in WalkDir::new(&bin)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_launcher = if cfg!(target_os = "windows") {
            name.ends_with("64.exe")
        } else {
            name.ends_with(".sh")
        };
        if is_launcher && entry.path().is_file() {
            return Some(entry.path().to_path_buf());
        }
    }
    None
}
