// ==========================================
// 自助终端管理后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager
// 约定: 配置缺失或格式错误时返回默认值，不向调用方报错
pub trait ImportConfigReader: Send + Sync {
    // ===== 后端连接 =====

    /// 后端接口基础地址（不含结尾斜杠）
    ///
    /// # 默认值
    /// - http://localhost:3000/api
    fn backend_base_url(&self) -> String;

    /// 单次请求超时（秒）
    ///
    /// # 默认值
    /// - 10
    fn request_timeout_secs(&self) -> u64;

    // ===== ZIP 导入 =====

    /// 压缩包大小上限（字节）
    ///
    /// # 默认值
    /// - 52428800 (50 MiB)
    fn zip_max_bytes(&self) -> u64;

    /// 压缩包内表格文件名（不含扩展名）
    ///
    /// # 默认值
    /// - productos
    fn zip_spreadsheet_stem(&self) -> String;

    // ===== 界面 =====

    /// 预览条数
    fn preview_limit(&self) -> usize;

    /// 后端状态刷新间隔（秒，最小 1）
    fn refresh_interval_secs(&self) -> u64;
}
