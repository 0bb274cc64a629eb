use csv::StringRecord;

/// CSV 欄位可能扮演的角色，宣告順序即比對優先順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Name,
    Device,
    Start,
    End,
    Video,
}

impl ColumnRole {
    pub const PRIORITY: [Self; 5] = [Self::Name, Self::Device, Self::Start, Self::End, Self::Video];

    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["event", "name", "事件"],
            Self::Device => &["device", "subfolder", "设备", "設備"],
            Self::Start => &["start", "modification_time", "开始", "開始"],
            Self::End => &["end", "结束", "結束"],
            Self::Video => &["video", "path", "file_path", "路径", "路徑"],
        }
    }

    /// 依優先順序找出標題對應的角色（不分大小寫的子字串比對）
    #[must_use]
    pub fn detect(header: &str) -> Option<Self> {
        let header = header.trim().to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|role| role.keywords().iter().any(|k| header.contains(k)))
    }
}

/// 各角色對應到的欄位索引
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    name: Option<usize>,
    device: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
    video: Option<usize>,
}

impl ColumnMap {
    /// 同一角色出現多次時以較後面的欄位為準
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = Self::default();
        for (index, header) in headers.into_iter().enumerate() {
            if let Some(role) = ColumnRole::detect(header) {
                *map.slot_mut(role) = Some(index);
            }
        }
        map
    }

    #[must_use]
    pub const fn index(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Name => self.name,
            ColumnRole::Device => self.device,
            ColumnRole::Start => self.start,
            ColumnRole::End => self.end,
            ColumnRole::Video => self.video,
        }
    }

    const fn slot_mut(&mut self, role: ColumnRole) -> &mut Option<usize> {
        match role {
            ColumnRole::Name => &mut self.name,
            ColumnRole::Device => &mut self.device,
            ColumnRole::Start => &mut self.start,
            ColumnRole::End => &mut self.end,
            ColumnRole::Video => &mut self.video,
        }
    }

    /// 原始欄位內容；欄位不存在時為 `None`
    #[must_use]
    pub fn raw<'r>(&self, role: ColumnRole, record: &'r StringRecord) -> Option<&'r str> {
        self.index(role).map(|i| record.get(i).unwrap_or_default())
    }

    /// 去除空白後的非空欄位內容
    #[must_use]
    pub fn value<'r>(&self, role: ColumnRole, record: &'r StringRecord) -> Option<&'r str> {
        self.raw(role, record)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}
