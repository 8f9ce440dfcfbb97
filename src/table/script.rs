use serde::{Deserialize, Serialize};

use super::render::{POPUP_LINK_CLASS, escape_html};

/// Size of the window opened for a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Script that opens `data-url` of every popup link in a sized window.
pub fn popup_script(options: PopupOptions) -> String {
    let PopupOptions { width, height } = options;
    format!(
        r#"<script>
(function() {{
    function openExternalPopup(event) {{
        event.preventDefault();
        const link = event.currentTarget;
        const imageUrl = link.getAttribute('data-url');
        const filename = link.getAttribute('data-filename') || 'image';
        if (!imageUrl) {{
            console.error('Could not find URL for link:', link);
            return;
        }}
        try {{
            window.open(imageUrl, filename, 'width={width},height={height},scrollbars=yes,resizable=yes');
        }} catch (e) {{
            console.error('Error opening popup:', e);
        }}
    }}
    function attach() {{
        document.querySelectorAll('a.{POPUP_LINK_CLASS}').forEach(function(link) {{
            if (!link.dataset.listenerAttached) {{
                link.addEventListener('click', openExternalPopup);
                link.dataset.listenerAttached = 'true';
            }}
        }});
    }}
    if (document.readyState === 'loading') {{
        document.addEventListener('DOMContentLoaded', attach);
    }} else {{
        attach();
    }}
}})();
</script>
"#
    )
}

/// Wraps rendered fragments in a minimal HTML document.
pub fn standalone_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}
