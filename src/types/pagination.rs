use handle_errors::Error;
use std::collections::HashMap;

/// Pagination 구조체는 쿼리 매개변수에서 추출된다
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 반환될 아이템의 최대 개수. None이면 끝까지 반환한다.
    pub limit: Option<usize>,
    /// 반환될 첫 번째 아이템의 인덱스
    pub offset: usize,
}

impl Pagination {
    /// 정렬이 끝난 피드에 적용한다.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let rest = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => rest.take(limit).collect(),
            None => rest.collect(),
        }
    }
}

/// 매개변수를 /questions 경로에서 추출하기
/// # 예제 쿼리
/// 이 경로에 대한 GET 요청에는 반환 받기 원하는 질문만 반환 받도록
/// 페이지 정보가 추가될 수 있다
/// /questions?limit=10&offset=20
///
/// 둘 중 하나만 있으면 `MissingParameters`, 둘 다 없으면 기본값을 돌려준다.
pub fn extract_pagination(params: &HashMap<String, String>) -> Result<Pagination, Error> {
    match (params.get("limit"), params.get("offset")) {
        (Some(limit), Some(offset)) => Ok(Pagination {
            limit: Some(limit.parse::<usize>().map_err(Error::ParseError)?),
            offset: offset.parse::<usize>().map_err(Error::ParseError)?,
        }),
        (None, None) => Ok(Pagination::default()),
        _ => Err(Error::MissingParameters),
    }
}
