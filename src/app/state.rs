// ==========================================
// SportChef 赛事编排系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 显式构造装配 (不用容器): Repository →
//       Engine → API 逐层手工注入
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AllowAllAuthorizer, EventApi, OperationAuthorizer, ScheduleApi, TimingApi};
use crate::config::ConfigManager;
use crate::engine::{
    CategoryLockRegistry, ConsistencyCoordinator, OptionalEventPublisher, ResultAggregator,
    ScheduleEventPublisher, ScheduleRepositories,
};
use crate::importer::{EntryImporter, UniversalFileParser};
use crate::repository::{
    ActionLogRepository, CategoryRepository, EventRepository, ParticipantRepository,
    ResultRepository, StartSlotRepository, TimingEventRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 赛事/报名API
    pub event_api: Arc<EventApi<ConfigManager>>,

    /// 秩序册API
    pub schedule_api: Arc<ScheduleApi<ConfigManager>>,

    /// 计时/成绩API
    pub timing_api: Arc<TimingApi>,

    /// 报名表导入器
    pub entry_importer: Arc<EntryImporter<ConfigManager>>,

    /// 操作日志仓储（用于审计追踪查询）
    pub action_log_repo: Arc<ActionLogRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例 (无事件发布器)
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::new_with_publisher(db_path, None)
    }

    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - event_publisher: 排程事件发布器 (可选)
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 初始化数据库连接并建表
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn new_with_publisher(
        db_path: String,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        let event_repo = Arc::new(EventRepository::new(conn.clone()));
        let category_repo = Arc::new(CategoryRepository::new(conn.clone()));
        let participant_repo = Arc::new(ParticipantRepository::new(conn.clone()));
        let slot_repo = Arc::new(StartSlotRepository::new(conn.clone()));
        let timing_repo = Arc::new(TimingEventRepository::new(conn.clone()));
        let result_repo = Arc::new(ResultRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // 组别锁注册表 (协调器与成绩引擎共享)
        let locks = Arc::new(CategoryLockRegistry::new());

        let repos = ScheduleRepositories::new(
            category_repo.clone(),
            participant_repo.clone(),
            slot_repo.clone(),
            timing_repo.clone(),
            result_repo.clone(),
            action_log_repo.clone(),
        );

        let aggregator_publisher = match &event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p.clone()),
            None => OptionalEventPublisher::none(),
        };
        let aggregator = Arc::new(ResultAggregator::new(
            repos.clone(),
            locks.clone(),
            aggregator_publisher,
        ));

        let coordinator_publisher = match &event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p.clone()),
            None => OptionalEventPublisher::none(),
        };
        let coordinator = Arc::new(ConsistencyCoordinator::new(
            config_manager.clone(),
            repos.clone(),
            aggregator.clone(),
            locks.clone(),
            coordinator_publisher,
        ));

        // ==========================================
        // 初始化API层
        // ==========================================

        // 授权检查属于被排除的身份边界, 核心默认全放行
        let authorizer: Arc<dyn OperationAuthorizer> = Arc::new(AllowAllAuthorizer);

        let event_api = Arc::new(EventApi::new(
            event_repo,
            category_repo.clone(),
            participant_repo,
            action_log_repo.clone(),
            coordinator.clone(),
            config_manager.clone(),
            authorizer.clone(),
        ));

        let schedule_api = Arc::new(ScheduleApi::new(
            category_repo,
            slot_repo,
            coordinator,
            authorizer.clone(),
        ));

        let timing_api = Arc::new(TimingApi::new(aggregator, authorizer));

        let entry_importer = Arc::new(EntryImporter::new(
            event_api.clone(),
            Box::new(UniversalFileParser),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            event_api,
            schedule_api,
            timing_api,
            entry_importer,
            action_log_repo,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 位于用户数据目录下 (不存在时回退到当前目录)
pub fn get_default_db_path() -> String {
    let mut dir = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    dir.push("sportchef");

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("创建数据目录失败(回退当前目录): {}", e);
        return "sportchef.db".to_string();
    }

    dir.push("sportchef.db");
    dir.display().to_string()
}
