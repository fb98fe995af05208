use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IconMode {
    Ascii,
    Unicode,
    #[default]
    Nerd,
}

/// Glyphs used by the renderer. Every entry is a single terminal cell wide.
#[derive(Debug, Clone, Copy)]
pub struct IconSet {
    pub app: &'static str,
    pub note: &'static str,
    pub notebook: &'static str,
    pub folder: &'static str,
    pub folder_open: &'static str,
    pub search: &'static str,
    pub edit: &'static str,
    pub help: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
    pub info: &'static str,
    pub modified: &'static str,
    pub saved: &'static str,
    pub selected: &'static str,
}

const ASCII: IconSet = IconSet {
    app: "#",
    note: "-",
    notebook: "+",
    folder: "+",
    folder_open: "*",
    search: "/",
    edit: "~",
    help: "?",
    warning: "!",
    error: "x",
    info: "i",
    modified: "*",
    saved: "=",
    selected: ">",
};

const UNICODE: IconSet = IconSet {
    app: "✎",
    note: "•",
    notebook: "▤",
    folder: "▸",
    folder_open: "▾",
    search: "⌕",
    edit: "✎",
    help: "?",
    warning: "⚠",
    error: "✗",
    info: "ℹ",
    modified: "●",
    saved: "✓",
    selected: "›",
};

const NERD: IconSet = IconSet {
    app: "\u{f0b9a}",
    note: "\u{f0b9e}",
    notebook: "\u{f02d}",
    folder: "\u{f07b}",
    folder_open: "\u{f07c}",
    search: "\u{f0349}",
    edit: "\u{f044}",
    help: "\u{f02d6}",
    warning: "\u{f071}",
    error: "\u{f00d}",
    info: "\u{f129}",
    modified: "\u{f02da}",
    saved: "\u{f00c}",
    selected: "\u{f054}",
};

impl IconMode {
    pub fn icons(self) -> &'static IconSet {
        match self {
            IconMode::Ascii => &ASCII,
            IconMode::Unicode => &UNICODE,
            IconMode::Nerd => &NERD,
        }
    }
}
