//! Dashboard page

use crate::config::CameraConfig;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>camstream | Live Dashboard</title>
    <style>
        body { background-color: #121212; color: #ffffff; font-family: monospace; text-align: center; }
        h1 { color: #00ff00; margin-top: 20px; }
        .container { display: flex; justify-content: center; margin-top: 20px; }
        img { border: 2px solid #333; box-shadow: 0 0 20px rgba(0, 255, 0, 0.2); }
        .stats { margin-top: 20px; color: #888; }
    </style>
</head>
<body>
    <h1>camstream // Remote Stream</h1>
    <div class="container">
        <img src="/video_feed" width="{width}" height="{height}">
    </div>
    <div class="stats">
        Status: LIVE | Protocol: MJPEG <br>
        Resolution: {width}x{height} | MJPEG Mode: {mjpg}
    </div>
</body>
</html>
"#;

/// Render the index page for the configured camera
pub fn render_index(camera: &CameraConfig) -> String {
    PAGE_TEMPLATE
        .replace("{width}", &camera.width.to_string())
        .replace("{height}", &camera.height.to_string())
        .replace("{mjpg}", if camera.force_mjpg { "True" } else { "False" })
}
