//! XML navigation helpers for parsed LIDO records.

mod utils;

pub use utils::{
    find_all_by_path, find_by_path, find_child, find_children, find_descendant, get_tag_name,
    get_text, text_by_path, texts_by_path,
};
