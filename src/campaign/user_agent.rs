//! User-Agent 随机化

/// 内置的浏览器 User-Agent
const BUILTIN_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// User-Agent 池
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// 使用自定义列表，列表为空时退回内置列表
    pub fn new(custom: &[String]) -> Self {
        let agents: Vec<String> = custom
            .iter()
            .map(|ua| ua.trim())
            .filter(|ua| !ua.is_empty())
            .map(str::to_string)
            .collect();

        if agents.is_empty() {
            Self::builtin()
        } else {
            Self { agents }
        }
    }

    pub fn builtin() -> Self {
        Self {
            agents: BUILTIN_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 随机挑选一个
    pub fn pick(&self) -> &str {
        &self.agents[fastrand::usize(..self.agents.len())]
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::builtin()
    }
}
