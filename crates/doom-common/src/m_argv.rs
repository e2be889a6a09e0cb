// m_argv.rs — command line argument access

/// The process command line, argv[0] included.
#[derive(Debug, Clone, Default)]
pub struct ComArgs {
    argv: Vec<String>,
}

impl ComArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Returns "" past the end, like an empty C string.
    pub fn argv(&self, arg: usize) -> &str {
        self.argv.get(arg).map(String::as_str).unwrap_or("")
    }

    /// Index of `parm` (case-insensitive), skipping the program name.
    pub fn check_parm(&self, parm: &str) -> Option<usize> {
        self.argv
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, a)| a.eq_ignore_ascii_case(parm))
            .map(|(i, _)| i)
    }

    /// The argument following `parm`, if present.
    pub fn parm_value(&self, parm: &str) -> Option<&str> {
        let p = self.check_parm(parm)?;
        self.argv.get(p + 1).map(String::as_str)
    }

    /// Every argument after `parm` up to the next switch.
    pub fn parm_values(&self, parm: &str) -> Vec<&str> {
        match self.check_parm(parm) {
            Some(p) => self.argv[p + 1..]
                .iter()
                .take_while(|a| !a.starts_with('-'))
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> ComArgs {
        ComArgs::from_args(s.split_whitespace())
    }

    #[test]
    fn test_check_parm_skips_program_name() {
        let a = args("-file x.wad -SKILL 4");
        assert_eq!(a.check_parm("-file"), None);
        let a = args("rdoom -file x.wad -SKILL 4");
        assert_eq!(a.check_parm("-file"), Some(1));
        assert_eq!(a.check_parm("-skill"), Some(3));
        assert_eq!(a.argv(99), "");
    }

    #[test]
    fn test_parm_values_stop_at_next_switch() {
        let a = args("rdoom -file a.wad b.wad -warp 1 3");
        assert_eq!(a.parm_values("-file"), vec!["a.wad", "b.wad"]);
        assert_eq!(a.parm_values("-warp"), vec!["1", "3"]);
        assert_eq!(a.parm_value("-warp"), Some("1"));
        assert!(a.parm_values("-record").is_empty());
    }
}
