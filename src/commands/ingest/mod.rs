mod bbox_layout;
mod run;
#[cfg(test)]
mod tests;

pub use bbox_layout::extract_pages;
pub use run::run;
