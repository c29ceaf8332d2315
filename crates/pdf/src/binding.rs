//! Locating and binding the PDFium shared library.

use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

use pagedeck_core::ConvertError;

/// Directory holding the PDFium library, checked before the default locations.
pub const PDFIUM_DIR_ENV: &str = "PAGEDECK_PDFIUM_DIR";

/// Directories searched for the PDFium library, in order.
pub fn pdfium_search_paths(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = configured {
        paths.push(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(PDFIUM_DIR_ENV) {
        paths.push(PathBuf::from(dir));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());

            // .app/Contents/MacOS/<bin> -> .app/Contents/Resources
            #[cfg(target_os = "macos")]
            {
                if let Some(contents_dir) = exe_dir.parent() {
                    paths.push(contents_dir.join("Resources").join("libs"));
                    paths.push(contents_dir.join("Resources"));
                }
            }

            #[cfg(target_os = "linux")]
            {
                if let Ok(appdir) = std::env::var("APPDIR") {
                    let appdir_path = PathBuf::from(appdir);
                    paths.push(appdir_path.join("usr").join("lib").join("libs"));
                    paths.push(appdir_path.join("usr").join("lib"));
                }
            }
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

/// Binds PDFium from the first search path that has it, else from the system library.
pub fn bind_pdfium(configured: Option<&Path>) -> Result<Pdfium, ConvertError> {
    for path in pdfium_search_paths(configured) {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(&path);
        log::debug!("[Pdfium] trying {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::info!("[Pdfium] loaded from {:?}", path);
            return Ok(Pdfium::new(bindings));
        }
    }

    log::debug!("[Pdfium] trying the system library");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ConvertError::Pdfium(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_dir_searched_first() {
        let paths = pdfium_search_paths(Some(Path::new("/opt/pdfium")));
        assert_eq!(paths[0], PathBuf::from("/opt/pdfium"));
        assert_eq!(paths.last(), Some(&PathBuf::from("./")));
    }
}
