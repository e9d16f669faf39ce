use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

/// Package version, git revision, and target triple, as shown by `--version`.
pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[cfg(test)]
mod tests {
	#[test]
	fn version_starts_with_package_version() {
		assert!(crate::VERSION.starts_with(env!("CARGO_PKG_VERSION")));
		assert!(crate::VERSION.ends_with(env!("VERGEN_CARGO_TARGET_TRIPLE")));
	}
}
