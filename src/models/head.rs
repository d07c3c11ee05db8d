/// 机器人头部型号
///
/// CSV 中的 `Head` 列是 "1".."6" 的键，表单下拉框里显示的是型号名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadOption {
    RollAThor = 1,
    PeanutCrusher = 2,
    Dave = 3,
    AndyRoid = 4,
    SpannerMate = 5,
    Drillbit2000 = 6,
}

impl HeadOption {
    pub const ALL: [HeadOption; 6] = [
        HeadOption::RollAThor,
        HeadOption::PeanutCrusher,
        HeadOption::Dave,
        HeadOption::AndyRoid,
        HeadOption::SpannerMate,
        HeadOption::Drillbit2000,
    ];

    /// 获取键值
    pub fn key(self) -> u8 {
        self as u8
    }

    /// 获取下拉框中显示的名称
    pub fn label(self) -> &'static str {
        match self {
            HeadOption::RollAThor => "Roll-a-thor head",
            HeadOption::PeanutCrusher => "Peanut crusher head",
            HeadOption::Dave => "D.A.V.E head",
            HeadOption::AndyRoid => "Andy Roid head",
            HeadOption::SpannerMate => "Spanner mate head",
            HeadOption::Drillbit2000 => "Drillbit 2000 head",
        }
    }

    /// 从 CSV 键解析，超出 "1".."6" 返回 None
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|head| head.key().to_string() == key)
    }
}
