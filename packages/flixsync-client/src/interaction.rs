/// 阻塞式的确认与提示框
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
}

/// 页面跳转
pub trait Navigator: Send + Sync {
    fn open_movie(&self, movie_id: &str);
}
