use tray_icon::{
    menu::{CheckMenuItem, Menu, MenuItem, PredefinedMenuItem},
    TrayIcon, TrayIconBuilder,
};
use wgtray::Caption;

pub const TRAY_ICON_CONNECTED: &[u8] = include_bytes!("../assets/connected.svg");
pub const TRAY_ICON_DISCONNECTED: &[u8] = include_bytes!("../assets/disconnected.svg");

pub const IMPORT_ID: &str = "import";
pub const QUIT_ID: &str = "quit";
/// Prefix of connection row ids; the rest of the id is the connection UUID.
pub const ROW_ID_PREFIX: &str = "conn:";

pub struct TrayComponents {
    pub tray: TrayIcon,
    /// Shared handle to the tray's menu; rows are inserted and removed through it.
    pub menu: Menu,
}

/// Render size for tray icons.
const TRAY_RENDER_SIZE: u32 = 256;

/// Convert SVG bytes to a tray icon
fn svg_to_tray_icon(svg_bytes: &[u8]) -> Result<tray_icon::Icon, Box<dyn std::error::Error>> {
    let opt = resvg::usvg::Options::default();
    let tree = resvg::usvg::Tree::from_data(svg_bytes, &opt)?;

    let size = TRAY_RENDER_SIZE;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size).ok_or("Failed to create pixmap")?;

    let transform = resvg::tiny_skia::Transform::from_scale(
        size as f32 / tree.size().width(),
        size as f32 / tree.size().height(),
    );

    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let rgba_data = pixmap.data().to_vec();

    Ok(tray_icon::Icon::from_rgba(rgba_data, size, size)?)
}

/// Solid grey square, used when the SVG cannot be rendered.
fn fallback_icon() -> Result<tray_icon::Icon, tray_icon::BadIcon> {
    let rgba = [96u8, 96, 96, 255].repeat(32 * 32);
    tray_icon::Icon::from_rgba(rgba, 32, 32)
}

fn icon_for(caption: &Caption) -> anyhow::Result<tray_icon::Icon> {
    let svg = if caption.is_connected() {
        TRAY_ICON_CONNECTED
    } else {
        TRAY_ICON_DISCONNECTED
    };
    match svg_to_tray_icon(svg) {
        Ok(icon) => Ok(icon),
        Err(e) => {
            log::warn!("Failed to load tray icon from SVG: {}, using fallback", e);
            Ok(fallback_icon()?)
        }
    }
}

/// Builds the tray icon with its static menu: separator, "Import config", "Quit".
/// Connection rows are inserted above the separator as they are discovered.
pub fn init_tray() -> anyhow::Result<TrayComponents> {
    let import_item = MenuItem::with_id(IMPORT_ID, "Import config", true, None);
    let quit_item = MenuItem::with_id(QUIT_ID, "Quit", true, None);

    let menu = Menu::with_items(&[
        &PredefinedMenuItem::separator(),
        &import_item,
        &quit_item,
    ])?;

    let caption = Caption::default();
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(menu.clone()))
        .with_tooltip(caption.tooltip())
        .with_icon(icon_for(&caption)?)
        .build()?;

    Ok(TrayComponents { tray, menu })
}

/// Creates the toggle row for one connection.
pub fn connection_row(uuid: &str, name: &str) -> CheckMenuItem {
    CheckMenuItem::with_id(format!("{}{}", ROW_ID_PREFIX, uuid), name, true, false, None)
}

/// Update the tray icon and tooltip to match the shared caption
pub fn update_tray_icon(tray: &TrayIcon, caption: &Caption) {
    if let Err(e) = tray.set_tooltip(Some(caption.tooltip())) {
        log::error!("Failed to update tray tooltip: {}", e);
    }

    match icon_for(caption) {
        Err(e) => log::error!("Failed to build tray icon: {}", e),
        Ok(icon) => {
            if let Err(e) = tray.set_icon(Some(icon)) {
                log::error!("Failed to update tray icon: {}", e);
            }
        }
    }
}
